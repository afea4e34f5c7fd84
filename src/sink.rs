//! Status sinks: the ratatui dashboard and plain-text/JSON output for
//! non-interactive use

use std::io::Write;

use anyhow::{Context, Result};
use ratatui::{backend::Backend, Terminal};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::app::{Action, AppState};
use crate::poll::StatusSink;
use crate::progress::{FleetSnapshot, SampleMap};
use crate::ui;

/// Redraws the dashboard on every poll
pub struct TerminalSink<B: Backend> {
    terminal: Terminal<B>,
    state: AppState,
    actions: mpsc::UnboundedReceiver<Action>,
}

impl<B: Backend> TerminalSink<B> {
    pub fn new(terminal: Terminal<B>, state: AppState, actions: mpsc::UnboundedReceiver<Action>) -> Self {
        Self {
            terminal,
            state,
            actions,
        }
    }

    /// Draw the current state without waiting for a poll
    pub fn draw(&mut self) -> Result<()> {
        let state = &self.state;
        self.terminal
            .draw(|frame| ui::render(frame, state))
            .context("Failed to draw dashboard")?;
        Ok(())
    }

    pub fn into_terminal(self) -> Terminal<B> {
        self.terminal
    }

    /// Apply key presses queued since the last draw
    fn drain_actions(&mut self) {
        while let Ok(action) = self.actions.try_recv() {
            self.state.apply(action);
        }
    }
}

impl<B: Backend> StatusSink for TerminalSink<B> {
    fn publish(&mut self, snapshot: &FleetSnapshot, samples: &SampleMap) -> Result<()> {
        self.drain_actions();
        self.state.update(snapshot, samples);
        self.draw()
    }

    /// Resizes need no state change; `draw` picks up the new size
    fn refresh(&mut self) -> Result<()> {
        self.drain_actions();
        self.draw()
    }
}

/// Run the terminal setup `open`, calling `restore` if it fails so a
/// half-initialized terminal is handed back to the user as it was
pub fn open_or_restore<T, E>(
    open: impl FnOnce() -> std::result::Result<T, E>,
    restore: impl FnOnce(),
) -> std::result::Result<T, E> {
    open().inspect_err(|_| restore())
}

/// One summary line per poll
pub struct HeadlessSink<W: Write> {
    out: W,
}

impl<W: Write> HeadlessSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Render the one-line summary of a snapshot
pub fn summary_line(snapshot: &FleetSnapshot) -> String {
    format!(
        "running {} | idle {} | users {} | {}/{} msgs ({:.2}%) | max ETA {}",
        snapshot.running_jobs,
        snapshot.idle_users,
        snapshot.total_users,
        snapshot.overall_transferred,
        snapshot.overall_total,
        snapshot.overall_percent(),
        ui::format::eta(snapshot.max_eta)
    )
}

impl<W: Write> StatusSink for HeadlessSink<W> {
    fn publish(&mut self, snapshot: &FleetSnapshot, _samples: &SampleMap) -> Result<()> {
        writeln!(self.out, "{}", summary_line(snapshot)).context("Failed to write status")?;
        self.out.flush().context("Failed to flush status")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    snapshot: &'a FleetSnapshot,
    samples: &'a SampleMap,
}

/// One JSON object per poll
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatusSink for JsonSink<W> {
    fn publish(&mut self, snapshot: &FleetSnapshot, samples: &SampleMap) -> Result<()> {
        let report = JsonReport { snapshot, samples };
        serde_json::to_writer(&mut self.out, &report).context("Failed to serialize status")?;
        writeln!(self.out).context("Failed to write status")?;
        self.out.flush().context("Failed to flush status")?;
        Ok(())
    }
}
