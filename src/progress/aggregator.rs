//! Fleet-level progress folding
//!
//! Every tick observes each discovered job once (last log line or a read
//! failure) and folds all observations, together with the samples carried
//! over from the previous tick, into a fresh [`FleetSnapshot`]. Nothing is
//! patched incrementally: the snapshot and the returned sample map are rebuilt
//! from scratch each time.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use super::parser::{parse_last_line, LineEvent, SyncProgress};
use super::tail::{read_last_line, DEFAULT_TAIL_WINDOW};
use crate::jobs::{JobMarker, JobState};

/// Last known progress of one job, keyed by source user in a [`SampleMap`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSample {
    pub eta: Option<NaiveDateTime>,
    pub transferred: u64,
    pub total: u64,
    pub remaining: u64,
    pub percent: f64,
}

impl ProgressSample {
    /// Build a sample from raw counts. `remaining` must not exceed `total`.
    ///
    /// An empty mailbox (`0/0 msgs left`) reports 0%.
    pub fn from_counts(remaining: u64, total: u64, eta: Option<NaiveDateTime>) -> Self {
        let transferred = total.saturating_sub(remaining);
        let percent = if total == 0 {
            0.0
        } else {
            transferred as f64 / total as f64 * 100.0
        };

        Self {
            eta,
            transferred,
            total,
            remaining,
            percent,
        }
    }
}

impl From<&SyncProgress> for ProgressSample {
    fn from(progress: &SyncProgress) -> Self {
        Self::from_counts(progress.remaining, progress.total, progress.eta)
    }
}

/// Per-user samples threaded from one tick into the next
pub type SampleMap = BTreeMap<String, ProgressSample>;

/// Aggregate view of the whole fleet for one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSnapshot {
    pub total_users: usize,
    pub running_jobs: usize,
    pub idle_users: usize,
    pub max_eta: Option<NaiveDateTime>,
    pub overall_total: u64,
    pub overall_transferred: u64,
    /// State of every discovered job; users missing here are idle
    pub jobs: BTreeMap<String, JobState>,
}

impl FleetSnapshot {
    /// Snapshot of a fleet with no live jobs
    pub fn idle(total_users: usize) -> Self {
        Self {
            total_users,
            running_jobs: 0,
            idle_users: total_users,
            max_eta: None,
            overall_total: 0,
            overall_transferred: 0,
            jobs: BTreeMap::new(),
        }
    }

    /// State of a user's job this tick
    pub fn job_state(&self, user: &str) -> JobState {
        self.jobs.get(user).copied().unwrap_or(JobState::Idle)
    }

    pub fn overall_percent(&self) -> f64 {
        if self.overall_total == 0 {
            0.0
        } else {
            self.overall_transferred as f64 / self.overall_total as f64 * 100.0
        }
    }
}

/// What a tick learned about a single job
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// The log's last line, classified
    Line(LineEvent),
    /// The log could not be read this tick
    Unreadable,
}

/// Reads job logs and folds them into snapshots
#[derive(Debug, Clone)]
pub struct Aggregator {
    total_users: usize,
    tail_window: u64,
}

impl Aggregator {
    pub fn new(total_users: usize) -> Self {
        Self {
            total_users,
            tail_window: DEFAULT_TAIL_WINDOW,
        }
    }

    /// Set how many trailing bytes of each log are read per tick
    pub fn with_tail_window(mut self, bytes: u64) -> Self {
        self.tail_window = bytes;
        self
    }

    pub fn total_users(&self) -> usize {
        self.total_users
    }

    /// Run one aggregation pass over the currently discovered jobs.
    ///
    /// `previous` is the sample map returned by the prior tick; it is not
    /// modified. The returned map only holds users that still have a marker.
    pub fn tick(&self, jobs: &[JobMarker], previous: &SampleMap) -> (FleetSnapshot, SampleMap) {
        let observations: BTreeMap<String, Observation> = jobs
            .iter()
            .map(|job| (job.user.clone(), self.observe(job)))
            .collect();

        fold(self.total_users, &observations, previous)
    }

    fn observe(&self, job: &JobMarker) -> Observation {
        match read_last_line(&job.log_path, self.tail_window) {
            Ok(line) => Observation::Line(parse_last_line(&line)),
            Err(e) => {
                debug!("Keeping last sample for {}: {}", job.user, e);
                Observation::Unreadable
            }
        }
    }
}

/// Fold per-job observations into a snapshot and the next sample map.
///
/// Pure: the result depends only on the arguments, and the `BTreeMap`
/// iteration order makes it independent of the order jobs were read in.
pub fn fold(
    total_users: usize,
    observations: &BTreeMap<String, Observation>,
    previous: &SampleMap,
) -> (FleetSnapshot, SampleMap) {
    let mut samples = SampleMap::new();
    let mut jobs = BTreeMap::new();

    for (user, observation) in observations {
        let carried = previous.get(user);

        let fallback = match observation {
            Observation::Line(LineEvent::Syncing(progress)) => {
                samples.insert(user.clone(), ProgressSample::from(progress));
                jobs.insert(user.clone(), JobState::Syncing);
                continue;
            }
            Observation::Line(LineEvent::Running) => JobState::Running,
            Observation::Line(LineEvent::Unparseable(reason)) => {
                debug!("Unparseable progress for {}: {}", user, reason);
                JobState::Unparseable
            }
            Observation::Unreadable => JobState::Running,
        };

        // A started job keeps its last counts until new ones arrive
        let state = match carried {
            Some(sample) => {
                samples.insert(user.clone(), sample.clone());
                JobState::Syncing
            }
            None => fallback,
        };

        jobs.insert(user.clone(), state);
    }

    let running_jobs = jobs.values().filter(|s| **s == JobState::Syncing).count();

    let max_eta = samples
        .iter()
        .filter(|(user, _)| jobs.get(*user) == Some(&JobState::Syncing))
        .filter_map(|(_, sample)| sample.eta)
        .max();

    let snapshot = FleetSnapshot {
        total_users,
        running_jobs,
        idle_users: total_users.saturating_sub(running_jobs),
        max_eta,
        overall_total: samples.values().map(|s| s.total).sum(),
        overall_transferred: samples.values().map(|s| s.transferred).sum(),
        jobs,
    };

    (snapshot, samples)
}
