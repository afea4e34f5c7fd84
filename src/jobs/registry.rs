//! Marker discovery and reconciliation against the user list

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::marker::{read_marker, user_from_file_name, JobMarker};
use crate::app::users::UserSpec;
use crate::error::Result;

/// List every readable marker in `dir`.
///
/// Files that are not `imapsync-<user>.pid` are ignored. Markers that are
/// half-written or vanish while being read are skipped for this pass. Only a
/// failure to list the directory itself is reported.
pub fn discover_jobs(dir: &Path) -> Result<Vec<JobMarker>> {
    let mut jobs = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let Ok(entry) = entry else {
            continue;
        };
        let path = entry.path();

        let is_marker = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(user_from_file_name)
            .is_some();
        if !is_marker || !path.is_file() {
            continue;
        }

        match read_marker(&path) {
            Ok(marker) => jobs.push(marker),
            Err(e) => debug!("Skipping marker {}: {}", path.display(), e),
        }
    }

    jobs.sort_by(|a, b| a.user.cmp(&b.user));
    Ok(jobs)
}

/// Discovers jobs for the configured users
#[derive(Debug, Clone)]
pub struct JobRegistry {
    dir: PathBuf,
    users: BTreeMap<String, UserSpec>,
}

impl JobRegistry {
    pub fn new(dir: impl Into<PathBuf>, users: BTreeMap<String, UserSpec>) -> Self {
        Self {
            dir: dir.into(),
            users,
        }
    }

    /// Directory scanned for markers
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current jobs of known users, ordered by user.
    ///
    /// Markers for users missing from the user list are dropped.
    pub fn discover(&self) -> Result<Vec<JobMarker>> {
        let jobs = discover_jobs(&self.dir)?;

        Ok(jobs
            .into_iter()
            .filter(|job| {
                let known = self.users.contains_key(&job.user);
                if !known {
                    debug!("Ignoring marker for unknown user: {}", job.user);
                }
                known
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn users(names: &[&str]) -> BTreeMap<String, UserSpec> {
        names
            .iter()
            .map(|n| (n.to_string(), UserSpec::new(*n, &format!("{}@dest", n))))
            .collect()
    }

    fn write_marker(dir: &Path, user: &str, contents: &str) {
        std::fs::write(dir.join(format!("imapsync-{}.pid", user)), contents).unwrap();
    }

    #[test]
    fn test_discover_jobs_skips_noise() {
        let dir = tempdir().unwrap();
        write_marker(dir.path(), "bob", "22\nbob.txt\n");
        write_marker(dir.path(), "alice", "11\nalice.txt\n");
        write_marker(dir.path(), "carol", "33\n");
        std::fs::write(dir.path().join("other.pid"), "44\nother.txt\n").unwrap();
        std::fs::create_dir(dir.path().join("imapsync-dir.pid")).unwrap();

        let jobs = discover_jobs(dir.path()).unwrap();
        let names: Vec<&str> = jobs.iter().map(|j| j.user.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_discover_missing_dir_fails() {
        let dir = tempdir().unwrap();
        assert!(discover_jobs(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_registry_drops_unknown_users() {
        let dir = tempdir().unwrap();
        write_marker(dir.path(), "alice", "11\nalice.txt\n");
        write_marker(dir.path(), "mallory", "66\nmallory.txt\n");

        let registry = JobRegistry::new(dir.path(), users(&["alice", "bob"]));
        let jobs = registry.discover().unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].user, "alice");
    }
}
