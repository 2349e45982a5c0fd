//! Event handling for the TUI dashboard.

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// TUI events.
#[derive(Debug, Clone)]
pub enum Event {
    /// Nothing happened within one tick.
    Tick,
    /// Keyboard input.
    Key(KeyEvent),
    /// Terminal resize.
    Resize(u16, u16),
}

/// Event handler for the TUI.
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    /// Create a new event handler with the given tick rate.
    #[must_use]
    pub const fn new(tick_rate_ms: u64) -> Self {
        Self {
            tick_rate: Duration::from_millis(tick_rate_ms),
        }
    }

    /// Poll for the next event with timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if event polling fails.
    pub fn next(&self) -> std::io::Result<Event> {
        if !event::poll(self.tick_rate)? {
            return Ok(Event::Tick);
        }
        match event::read()? {
            // Windows reports both press and release
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
            CrosstermEvent::Resize(w, h) => Ok(Event::Resize(w, h)),
            _ => Ok(Event::Tick),
        }
    }
}

/// Key action resulting from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    /// Reload the current range.
    Refresh,
    /// Move the focused bound one day back.
    PrevDay,
    /// Move the focused bound one day forward.
    NextDay,
    /// Move the focused bound one week back.
    PrevWeek,
    /// Move the focused bound one week forward.
    NextWeek,
    /// Switch focus between start and end.
    SwitchFocus,
    /// Clear the focused bound.
    ClearBound,
    /// Back to the default range.
    ResetRange,
    /// Scroll the cost table.
    ScrollUp,
    ScrollDown,
    Help,
    None,
}

impl KeyAction {
    /// Parse a key event into an action.
    #[must_use]
    pub const fn from_key_event(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Self::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Self::Quit,
            KeyCode::Char('r') | KeyCode::F(5) => Self::Refresh,
            KeyCode::Left | KeyCode::Char('h') => Self::PrevDay,
            KeyCode::Right | KeyCode::Char('l') => Self::NextDay,
            KeyCode::Down => Self::PrevWeek,
            KeyCode::Up => Self::NextWeek,
            KeyCode::Tab | KeyCode::BackTab => Self::SwitchFocus,
            KeyCode::Backspace | KeyCode::Delete => Self::ClearBound,
            KeyCode::Char('t') => Self::ResetRange,
            KeyCode::Char('k') | KeyCode::PageUp => Self::ScrollUp,
            KeyCode::Char('j') | KeyCode::PageDown => Self::ScrollDown,
            KeyCode::Char('?') | KeyCode::F(1) => Self::Help,
            _ => Self::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_move_dates() {
        assert_eq!(KeyAction::from_key_event(key(KeyCode::Left)), KeyAction::PrevDay);
        assert_eq!(KeyAction::from_key_event(key(KeyCode::Right)), KeyAction::NextDay);
        assert_eq!(KeyAction::from_key_event(key(KeyCode::Up)), KeyAction::NextWeek);
        assert_eq!(KeyAction::from_key_event(key(KeyCode::Down)), KeyAction::PrevWeek);
    }

    #[test]
    fn picker_keys() {
        assert_eq!(KeyAction::from_key_event(key(KeyCode::Tab)), KeyAction::SwitchFocus);
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Backspace)),
            KeyAction::ClearBound
        );
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Char('t'))),
            KeyAction::ResetRange
        );
    }

    #[test]
    fn ctrl_c_quits() {
        let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(KeyAction::from_key_event(event), KeyAction::Quit);
        assert_eq!(KeyAction::from_key_event(key(KeyCode::Char('c'))), KeyAction::None);
    }
}
