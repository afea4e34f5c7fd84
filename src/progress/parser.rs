//! Progress line grammar
//!
//! imapsync ends its periodic progress lines with a `<remaining>/<total> msgs left`
//! token and usually carries an `ETA: ... <YYYY-MM-DD HH:MM:SS> ...` segment
//! before it. The line is tokenized on whitespace; counts and ETA are
//! extracted by independent functions so each can be tested on its own.

use chrono::NaiveDateTime;

use crate::error::StatusError;

/// Timestamp layout expected after the `ETA:` marker
pub const ETA_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ETA_MARKER: &str = "ETA:";

/// Message counts from a `<remaining>/<total> msgs left` token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub remaining: u64,
    pub total: u64,
}

/// Progress extracted from a syncing line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncProgress {
    pub eta: Option<NaiveDateTime>,
    pub remaining: u64,
    pub total: u64,
}

impl SyncProgress {
    pub fn transferred(&self) -> u64 {
        self.total - self.remaining
    }
}

/// Classification of a job's last log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// The line reports message counts
    Syncing(SyncProgress),
    /// Process alive, nothing quantifiable yet
    Running,
    /// A counts token was found but its numbers are unusable
    Unparseable(String),
}

/// Classify a single log line.
///
/// Never fails: lines without a counts token are `Running`, and a counts
/// token with bad numbers is `Unparseable`.
pub fn parse_last_line(line: &str) -> LineEvent {
    match extract_counts(line) {
        Ok(Some(counts)) => LineEvent::Syncing(SyncProgress {
            eta: extract_eta(line),
            remaining: counts.remaining,
            total: counts.total,
        }),
        Ok(None) => LineEvent::Running,
        Err(e) => LineEvent::Unparseable(e.to_string()),
    }
}

/// Find the trailing `<remaining>/<total> msgs left` token.
///
/// Returns `Ok(None)` when the line has no such token and
/// `Err(LineUnparseable)` when the token is present but its numbers are not
/// non-negative integers or `remaining` exceeds `total`.
pub fn extract_counts(line: &str) -> Result<Option<Counts>, StatusError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [.., counts, "msgs", "left"] = tokens.as_slice() else {
        return Ok(None);
    };

    let Some((remaining, total)) = counts.split_once('/') else {
        return Ok(None);
    };

    let remaining = parse_count(remaining)?;
    let total = parse_count(total)?;

    if remaining > total {
        return Err(StatusError::LineUnparseable(format!(
            "remaining {} exceeds total {}",
            remaining, total
        )));
    }

    Ok(Some(Counts { remaining, total }))
}

fn parse_count(token: &str) -> Result<u64, StatusError> {
    token
        .parse::<u64>()
        .map_err(|e| StatusError::LineUnparseable(format!("bad count '{}': {}", token, e)))
}

/// Find the ETA timestamp following the `ETA:` marker.
///
/// Free text (weekday names, offsets) may surround the timestamp; the first
/// adjacent `date time` token pair that parses with [`ETA_FORMAT`] wins.
/// A missing marker or a non-conforming timestamp yields `None`.
pub fn extract_eta(line: &str) -> Option<NaiveDateTime> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let start = tokens.iter().position(|t| *t == ETA_MARKER)? + 1;

    tokens[start..].windows(2).find_map(|pair| {
        let candidate = format!("{} {}", pair[0], pair[1]);
        NaiveDateTime::parse_from_str(&candidate, ETA_FORMAT).ok()
    })
}
