//! Migration job discovery
//!
//! A job exists exactly while the launcher's `imapsync-<user>.pid` marker is
//! present. Markers are only ever read here, never written or removed.

pub mod marker;
pub mod registry;

pub use marker::{read_marker, JobMarker};
pub use registry::{discover_jobs, JobRegistry};

use serde::Serialize;

/// Per-tick state of a user's migration job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// No marker file
    #[default]
    Idle,
    /// Marker present, no message counts in the log yet
    Running,
    /// Log reports message counts
    Syncing,
    /// Log reports counts that cannot be read
    Unparseable,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Running => "running",
            JobState::Syncing => "syncing",
            JobState::Unparseable => "unparseable",
        }
    }

    /// Status icon for the job list
    pub fn icon(&self) -> &'static str {
        match self {
            JobState::Idle => "○",
            JobState::Running => "◌",
            JobState::Syncing => "●",
            JobState::Unparseable => "?",
        }
    }

    /// Get color for ratatui
    pub fn color(&self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self {
            JobState::Idle => Color::Gray,
            JobState::Running => Color::Yellow,
            JobState::Syncing => Color::Blue,
            JobState::Unparseable => Color::Red,
        }
    }

    /// Whether the job has a marker this tick
    pub fn is_live(&self) -> bool {
        !matches!(self, JobState::Idle)
    }
}
