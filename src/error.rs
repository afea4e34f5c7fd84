//! Error types for the status engine
//!
//! Only start-up failures (`ConfigMissing`, `UserFileMalformed`) are fatal.
//! Everything else is absorbed by the poll loop and shows up as an idle or
//! stale job in the snapshot.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatusError {
    /// The user file does not exist
    #[error("User file '{}' does not exist", .path.display())]
    ConfigMissing { path: PathBuf },

    /// A row of the user file could not be read
    #[error("User file line {line}: {reason}")]
    UserFileMalformed { line: usize, reason: String },

    /// A marker file exists but its pid or log path cannot be located
    #[error("Marker '{}' is corrupt: {reason}", .path.display())]
    MarkerCorrupt { path: PathBuf, reason: String },

    /// A job log is missing, empty or not readable
    #[error("Log '{}' is unreadable: {reason}", .path.display())]
    LogUnreadable { path: PathBuf, reason: String },

    /// A progress line has malformed numeric tokens
    #[error("Unparseable progress line: {0}")]
    LineUnparseable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StatusError>;
