//! User list loading
//!
//! The user file is the launcher's `;`-separated CSV: source user first,
//! destination user second, anything after that (hosts, passwords, extra
//! imapsync flags) is the launcher's business and ignored here.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::{Result, StatusError};

const DELIMITER: char = ';';

/// One mailbox to migrate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSpec {
    pub source_user: String,
    pub dest_user: String,
}

impl UserSpec {
    pub fn new(source_user: impl Into<String>, dest_user: impl Into<String>) -> Self {
        Self {
            source_user: source_user.into(),
            dest_user: dest_user.into(),
        }
    }
}

/// Load the user file, ordered by source user.
///
/// A missing file is `ConfigMissing`. Blank lines are ignored and a repeated
/// source user keeps its last row.
pub fn load_users(path: &Path, skip_first_line: bool) -> Result<BTreeMap<String, UserSpec>> {
    if !path.exists() {
        return Err(StatusError::ConfigMissing {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    parse_users(&content, skip_first_line)
}

/// Parse user file contents
pub fn parse_users(content: &str, skip_first_line: bool) -> Result<BTreeMap<String, UserSpec>> {
    let mut users = BTreeMap::new();

    for (idx, line) in content.lines().enumerate() {
        if skip_first_line && idx == 0 {
            continue;
        }

        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split(DELIMITER).map(str::trim);
        let source_user = fields.next().unwrap_or_default();
        let dest_user = fields.next().ok_or_else(|| StatusError::UserFileMalformed {
            line: idx + 1,
            reason: "missing destination user".to_string(),
        })?;

        if source_user.is_empty() {
            return Err(StatusError::UserFileMalformed {
                line: idx + 1,
                reason: "empty source user".to_string(),
            });
        }

        users.insert(
            source_user.to_string(),
            UserSpec::new(source_user, dest_user),
        );
    }

    Ok(users)
}
