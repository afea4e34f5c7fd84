//! Formatting helpers for dashboard cells

use chrono::NaiveDateTime;
use ratatui::style::Color;

/// Placeholder shown before the first poll and for unknown values
pub const UNKNOWN: &str = "?";

/// Text progress bar: █ for the done part, ░ for the rest
pub fn bar(percent: f64, width: usize) -> String {
    let ratio = (percent / 100.0).clamp(0.0, 1.0);
    let filled = (ratio * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn eta(eta: Option<NaiveDateTime>) -> String {
    eta.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn percent(percent: f64) -> String {
    format!("{:>6.2}%", percent)
}

/// Stable 256-color palette entry for a user
pub fn user_color(user: &str) -> Color {
    // FNV-1a
    let hash = user
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3));
    // Skip the 16 system colors and the greyscale ramp
    Color::Indexed(16 + (hash % 216) as u8)
}
