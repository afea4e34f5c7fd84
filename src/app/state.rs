use std::collections::BTreeMap;

use crate::app::events::Action;
use crate::app::users::UserSpec;
use crate::jobs::JobState;
use crate::progress::{FleetSnapshot, ProgressSample, SampleMap};

const SPINNER_FRAMES: [&str; 4] = ["⠋", "⠙", "⠹", "⠸"];

/// One row of the job list
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow<'a> {
    pub user: &'a UserSpec,
    pub state: JobState,
    pub sample: Option<&'a ProgressSample>,
}

/// Everything the dashboard draws
#[derive(Debug, Clone)]
pub struct AppState {
    /// Configured users, ordered by source user
    pub users: Vec<UserSpec>,
    /// Latest snapshot; `None` until the first poll completes
    pub snapshot: Option<FleetSnapshot>,
    /// Latest per-user samples
    pub samples: SampleMap,
    /// Only list users with a live job
    pub show_running: bool,
    /// Number of polls received, drives the spinner
    pub tick_count: u64,
}

impl AppState {
    pub fn new(users: &BTreeMap<String, UserSpec>, show_running: bool) -> Self {
        Self {
            users: users.values().cloned().collect(),
            snapshot: None,
            samples: SampleMap::new(),
            show_running,
            tick_count: 0,
        }
    }

    /// Store the result of a poll
    pub fn update(&mut self, snapshot: &FleetSnapshot, samples: &SampleMap) {
        self.snapshot = Some(snapshot.clone());
        self.samples = samples.clone();
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    pub fn apply(&mut self, action: Action) {
        if action == Action::ToggleShowRunning {
            self.show_running = !self.show_running;
        }
    }

    pub fn job_state(&self, user: &str) -> JobState {
        self.snapshot
            .as_ref()
            .map(|s| s.job_state(user))
            .unwrap_or_default()
    }

    /// Rows for the job list, honoring the show-running filter
    pub fn rows(&self) -> Vec<JobRow<'_>> {
        self.users
            .iter()
            .map(|user| JobRow {
                user,
                state: self.job_state(&user.source_user),
                sample: self.samples.get(&user.source_user),
            })
            .filter(|row| !self.show_running || row.state.is_live())
            .collect()
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[(self.tick_count % SPINNER_FRAMES.len() as u64) as usize]
    }
}
