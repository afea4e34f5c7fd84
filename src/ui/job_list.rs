use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Row, Table},
    Frame,
};

use super::format;
use crate::app::{AppState, JobRow};
use crate::jobs::JobState;

const BAR_WIDTH: usize = 24;

/// ジョブ一覧を描画
pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let header = Row::new(vec!["User", "", "Progress", "Messages", "ETA", "Done"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .height(1);

    let spinner = state.spinner();
    let rows: Vec<Row> = state
        .rows()
        .iter()
        .map(|row| create_row(row, spinner))
        .collect();

    let widths = [
        Constraint::Min(20),                       // User
        Constraint::Length(2),                     // State
        Constraint::Length(BAR_WIDTH as u16),      // Progress
        Constraint::Length(17),                    // Messages
        Constraint::Length(19),                    // ETA
        Constraint::Length(8),                     // Done
    ];

    let title = if state.show_running {
        " Jobs (running only) "
    } else {
        " Jobs "
    };

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );

    frame.render_widget(table, area);
}

fn create_row(row: &JobRow<'_>, spinner: &'static str) -> Row<'static> {
    let user_style = Style::default()
        .fg(format::user_color(&row.user.source_user))
        .add_modifier(Modifier::BOLD);

    let icon = match row.state {
        JobState::Syncing => spinner,
        other => other.icon(),
    };
    let state_cell = Span::styled(icon, Style::default().fg(row.state.color()));

    let (bar, messages, eta, done) = match row.sample {
        Some(sample) => (
            format::bar(sample.percent, BAR_WIDTH),
            format!("{}/{}", sample.transferred, sample.total),
            format::eta(sample.eta),
            format::percent(sample.percent),
        ),
        None => (
            format::bar(0.0, BAR_WIDTH),
            row.state.as_str().to_string(),
            format::UNKNOWN.to_string(),
            String::new(),
        ),
    };

    Row::new(vec![
        Line::from(Span::styled(row.user.source_user.clone(), user_style)),
        Line::from(state_cell),
        Line::from(Span::styled(bar, Style::default().fg(Color::Magenta))),
        Line::from(Span::styled(messages, Style::default().fg(Color::Gray))),
        Line::from(eta),
        Line::from(done),
    ])
    .height(1)
}
