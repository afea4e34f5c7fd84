use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// Terminal input relevant to the dashboard
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Key press
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
}

/// User action derived from a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Toggle the show-running filter
    ToggleShowRunning,
    /// Stop polling and exit
    Quit,
    /// Nothing to do
    None,
}

impl From<KeyEvent> for Action {
    fn from(key: KeyEvent) -> Self {
        if key.kind == KeyEventKind::Release {
            return Action::None;
        }
        match (key.code, key.modifiers) {
            (KeyCode::Char('r'), _) => Action::ToggleShowRunning,
            (KeyCode::Char('q') | KeyCode::Esc, _) => Action::Quit,
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
            _ => Action::None,
        }
    }
}

/// Wait up to `timeout` for terminal input
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<AppEvent>> {
    if event::poll(timeout)? {
        match event::read()? {
            Event::Key(key) => Ok(Some(AppEvent::Key(key))),
            Event::Resize(w, h) => Ok(Some(AppEvent::Resize(w, h))),
            _ => Ok(None),
        }
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_actions() {
        let key = |code, modifiers| KeyEvent::new(code, modifiers);

        assert_eq!(Action::from(key(KeyCode::Char('q'), KeyModifiers::NONE)), Action::Quit);
        assert_eq!(Action::from(key(KeyCode::Esc, KeyModifiers::NONE)), Action::Quit);
        assert_eq!(Action::from(key(KeyCode::Char('c'), KeyModifiers::CONTROL)), Action::Quit);
        assert_eq!(
            Action::from(key(KeyCode::Char('r'), KeyModifiers::NONE)),
            Action::ToggleShowRunning
        );
        assert_eq!(Action::from(key(KeyCode::Char('c'), KeyModifiers::NONE)), Action::None);
    }
}
