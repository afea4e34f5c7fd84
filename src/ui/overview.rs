//! Fleet-level panels: overall status counters and overall progress gauge

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use super::format;
use crate::app::AppState;

/// Counters row: total users, running jobs, idle users, slowest ETA
pub fn render_status(frame: &mut Frame, area: Rect, state: &AppState) {
    let total_users = state.users.len().to_string();
    let (running, idle, max_eta) = match state.snapshot {
        Some(ref snapshot) => (
            snapshot.running_jobs.to_string(),
            snapshot.idle_users.to_string(),
            format::eta(snapshot.max_eta),
        ),
        None => (
            format::UNKNOWN.to_string(),
            format::UNKNOWN.to_string(),
            format::UNKNOWN.to_string(),
        ),
    };

    let value = Style::default()
        .fg(Color::LightCyan)
        .add_modifier(Modifier::BOLD);
    let line = Line::from(vec![
        Span::raw("Total users: "),
        Span::styled(total_users, value),
        Span::raw("   Running jobs: "),
        Span::styled(running, value),
        Span::raw("   Idle users: "),
        Span::styled(idle, value),
        Span::raw("   Maximum ETA: "),
        Span::styled(max_eta, Style::default().add_modifier(Modifier::BOLD)),
    ]);

    let paragraph = Paragraph::new(line).alignment(Alignment::Left).block(
        Block::default()
            .title(" Overall Status ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );

    frame.render_widget(paragraph, area);
}

/// Gauge over the summed message counts of all syncing jobs
pub fn render_progress(frame: &mut Frame, area: Rect, state: &AppState) {
    let (ratio, label) = match state.snapshot {
        Some(ref snapshot) => (
            snapshot.overall_percent() / 100.0,
            format!(
                "{} Running Jobs  {}/{}  {}",
                snapshot.running_jobs,
                snapshot.overall_transferred,
                snapshot.overall_total,
                format::percent(snapshot.overall_percent()).trim_start()
            ),
        ),
        None => (0.0, format!("{} Running Jobs", format::UNKNOWN)),
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(" Overall Progress ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(label);

    frame.render_widget(gauge, area);
}
