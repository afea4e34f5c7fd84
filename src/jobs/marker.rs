//! PID marker files written by the launcher
//!
//! A marker is named `imapsync-<user>.pid` and holds, on separate lines in
//! no particular order, the process id and the path of the job's log. The
//! launcher may write it in several steps, so a marker that cannot be parsed
//! yet is expected and simply retried on the next tick.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{Result, StatusError};

/// Marker file name prefix
pub const MARKER_PREFIX: &str = "imapsync-";

/// Marker file name suffix
pub const MARKER_SUFFIX: &str = ".pid";

/// A running job as recorded by its marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMarker {
    /// Source user the job migrates
    pub user: String,
    /// Process id of the imapsync process
    pub pid: u32,
    /// Log file of the job
    pub log_path: PathBuf,
    /// The marker file itself
    pub marker_path: PathBuf,
}

fn pid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // A line holding only a positive integer
    PATTERN.get_or_init(|| Regex::new(r"(?m)^\s*([1-9][0-9]*)\s*$").unwrap())
}

fn log_path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // A line ending in a log suffix
    PATTERN.get_or_init(|| Regex::new(r"(?m)^\s*(.+\.(?:txt|log))\s*$").unwrap())
}

/// Extract the user from a marker file name, `None` for other files
pub fn user_from_file_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix(MARKER_PREFIX)?
        .strip_suffix(MARKER_SUFFIX)
        .filter(|user| !user.is_empty())
}

/// Read and parse a marker file.
///
/// The pid and the log path are located by two independent searches; both
/// must succeed or the marker is reported as `MarkerCorrupt`. A relative log
/// path is resolved against the marker's directory.
pub fn read_marker(path: &Path) -> Result<JobMarker> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| corrupt(path, "marker has no file name"))?;
    let user = user_from_file_name(file_name)
        .ok_or_else(|| corrupt(path, "file name is not imapsync-<user>.pid"))?
        .to_string();

    let data = std::fs::read_to_string(path)?;
    let (pid, log_path) = parse_marker_contents(&data).map_err(|reason| corrupt(path, reason))?;

    let log_path = if log_path.is_relative() {
        path.parent().unwrap_or(Path::new(".")).join(log_path)
    } else {
        log_path
    };

    Ok(JobMarker {
        user,
        pid,
        log_path,
        marker_path: path.to_path_buf(),
    })
}

/// Locate the pid and log path inside marker contents
fn parse_marker_contents(data: &str) -> std::result::Result<(u32, PathBuf), &'static str> {
    let pid = pid_pattern()
        .captures(data)
        .and_then(|caps| caps.get(1))
        .ok_or("no process id found")?
        .as_str()
        .parse::<u32>()
        .map_err(|_| "process id out of range")?;

    let log_path = log_path_pattern()
        .captures(data)
        .and_then(|caps| caps.get(1))
        .ok_or("no log path found")?
        .as_str()
        .trim();

    Ok((pid, PathBuf::from(log_path)))
}

fn corrupt(path: &Path, reason: &str) -> StatusError {
    StatusError::MarkerCorrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_user_from_file_name() {
        assert_eq!(user_from_file_name("imapsync-alice.pid"), Some("alice"));
        assert_eq!(
            user_from_file_name("imapsync-bob@example.com.pid"),
            Some("bob@example.com")
        );
        assert_eq!(user_from_file_name("imapsync-.pid"), None);
        assert_eq!(user_from_file_name("other.pid"), None);
        assert_eq!(user_from_file_name("imapsync-alice.pid.bak"), None);
    }

    #[test]
    fn test_parse_marker_any_order() {
        assert_eq!(
            parse_marker_contents("4242\n/var/log/imapsync/alice.txt\n").unwrap(),
            (4242, PathBuf::from("/var/log/imapsync/alice.txt"))
        );
        assert_eq!(
            parse_marker_contents("LOG/alice.txt\n105\n").unwrap(),
            (105, PathBuf::from("LOG/alice.txt"))
        );
    }

    #[test]
    fn test_parse_marker_missing_fields() {
        assert!(parse_marker_contents("").is_err());
        assert!(parse_marker_contents("4242\n").is_err());
        assert!(parse_marker_contents("/tmp/alice.txt\n").is_err());
        assert!(parse_marker_contents("0\n/tmp/alice.txt\n").is_err());
        assert!(parse_marker_contents("99999999999\n/tmp/alice.txt\n").is_err());
    }

    #[test]
    fn test_read_marker_resolves_relative_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("imapsync-alice.pid");
        std::fs::write(&path, "1234\nLOG_imapsync/alice.txt\n").unwrap();

        let marker = read_marker(&path).unwrap();
        assert_eq!(marker.user, "alice");
        assert_eq!(marker.pid, 1234);
        assert_eq!(marker.log_path, dir.path().join("LOG_imapsync/alice.txt"));
        assert_eq!(marker.marker_path, path);
    }

    #[test]
    fn test_read_marker_half_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("imapsync-alice.pid");
        std::fs::write(&path, "1234\n").unwrap();

        assert!(matches!(
            read_marker(&path),
            Err(StatusError::MarkerCorrupt { .. })
        ));
    }
}
