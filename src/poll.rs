//! Fixed-rate poll loop
//!
//! One pass = discover markers, aggregate, publish. Passes never overlap: a
//! slow sink pushes the next pass back instead of queueing it. The loop only
//! ends through its cancellation token.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::jobs::JobRegistry;
use crate::progress::{Aggregator, FleetSnapshot, SampleMap};

/// Receives the result of every poll
pub trait StatusSink {
    fn publish(&mut self, snapshot: &FleetSnapshot, samples: &SampleMap) -> Result<()>;

    /// Redraw from the last published data after user input
    fn refresh(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Drives registry and aggregator at a fixed interval
pub struct Poller {
    registry: JobRegistry,
    aggregator: Aggregator,
    interval: Duration,
}

/// Loop state carried from one pass into the next
#[derive(Debug, Clone, PartialEq)]
pub struct PollState {
    pub snapshot: FleetSnapshot,
    pub samples: SampleMap,
}

impl PollState {
    pub fn new(total_users: usize) -> Self {
        Self {
            snapshot: FleetSnapshot::idle(total_users),
            samples: SampleMap::new(),
        }
    }
}

impl Poller {
    pub fn new(registry: JobRegistry, aggregator: Aggregator, interval: Duration) -> Self {
        Self {
            registry,
            aggregator,
            interval,
        }
    }

    /// Run a single pass.
    ///
    /// If the marker directory cannot be listed the previous state is
    /// returned unchanged, so a transient failure does not blank the display.
    pub fn poll_once(&self, previous: &PollState) -> PollState {
        match self.registry.discover() {
            Ok(jobs) => {
                let (snapshot, samples) = self.aggregator.tick(&jobs, &previous.samples);
                debug!(
                    "Poll: {} jobs, {} running, {}/{} msgs",
                    jobs.len(),
                    snapshot.running_jobs,
                    snapshot.overall_transferred,
                    snapshot.overall_total
                );
                PollState { snapshot, samples }
            }
            Err(e) => {
                warn!(
                    "Failed to list markers in {}: {}",
                    self.registry.dir().display(),
                    e
                );
                previous.clone()
            }
        }
    }

    /// Poll until `cancel` fires.
    ///
    /// Each iteration waits one interval (or returns early on cancellation),
    /// polls, and hands the result to `sink`. Sink errors are logged and the
    /// loop carries on.
    pub async fn run<S: StatusSink>(&self, sink: &mut S, cancel: CancellationToken) -> PollState {
        self.run_with_input(sink, &Notify::new(), cancel).await
    }

    /// Like [`Poller::run`], and also calls [`StatusSink::refresh`] whenever
    /// `input` is notified. Input does not move the next poll.
    pub async fn run_with_input<S: StatusSink>(
        &self,
        sink: &mut S,
        input: &Notify,
        cancel: CancellationToken,
    ) -> PollState {
        info!(
            "Poll loop started (interval: {}ms, dir: {})",
            self.interval.as_millis(),
            self.registry.dir().display()
        );

        let mut state = PollState::new(self.aggregator.total_users());
        let mut next_poll = Instant::now() + self.interval;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = input.notified() => {
                    if let Err(e) = sink.refresh() {
                        warn!("Status sink error: {}", e);
                    }
                    continue;
                }
                _ = tokio::time::sleep_until(next_poll) => {}
            }

            state = self.poll_once(&state);
            next_poll = Instant::now() + self.interval;

            if let Err(e) = sink.publish(&state.snapshot, &state.samples) {
                warn!("Status sink error: {}", e);
            }
        }

        info!("Poll loop stopped");
        state
    }
}
