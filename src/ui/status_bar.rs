use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::AppState;

const KEY_HINT: &str = " r: filter  q: quit ";

/// ステータスバーを描画
pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let filter = if state.show_running { "running only" } else { "all users" };
    let polls = match state.snapshot {
        Some(_) => format!("poll #{}", state.tick_count),
        None => "waiting for first poll".to_string(),
    };

    let summary = Line::from(vec![
        Span::styled(
            format!(" {} of {} users shown ", state.rows().len(), state.users.len()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(format!("({}) ", filter), Style::default().fg(Color::Cyan)),
        Span::styled(format!("| {}", polls), Style::default().fg(Color::DarkGray)),
    ]);

    let hint = Span::styled(
        KEY_HINT,
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    );

    let [left, right] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(KEY_HINT.len() as u16)]).areas(area);

    frame.render_widget(Paragraph::new(summary), left);
    frame.render_widget(Paragraph::new(Line::from(hint)), right);
}
