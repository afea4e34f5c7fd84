pub mod format;
pub mod job_list;
pub mod overview;
pub mod status_bar;

use ratatui::{
    layout::{Alignment, Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::AppState;

/// Rows used by everything except the job list
const CHROME_HEIGHT: u16 = 3 + 3 + 3 + 1;

/// Height needed to show every job row without scrolling
pub fn full_height(user_count: usize) -> u16 {
    // list border + header
    CHROME_HEIGHT + 3 + user_count.min(u16::MAX as usize / 2) as u16
}

/// メインUIを描画
pub fn render(frame: &mut Frame, state: &AppState) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(3), // タイトル
        Constraint::Length(3), // Overall Status
        Constraint::Min(4),    // Jobs
        Constraint::Length(3), // Overall Progress
        Constraint::Length(1), // ステータスバー
    ])
    .split(area);

    render_title(frame, chunks[0]);
    overview::render_status(frame, chunks[1], state);
    job_list::render(frame, chunks[2], state);
    overview::render_progress(frame, chunks[3], state);
    status_bar::render(frame, chunks[4], state);
}

fn render_title(frame: &mut Frame, area: ratatui::layout::Rect) {
    let title = Line::from(vec![
        Span::styled("Welcome to ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            "Imapsync",
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" Status!", Style::default().add_modifier(Modifier::BOLD)),
    ]);

    let paragraph = Paragraph::new(title)
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}
