use std::time::Duration;
use tracing::trace;

use crate::domain::{DashboardConfig, DashboardError, Message};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &DashboardConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, DashboardError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            return Ok(self.handle_key(key, model.raw_keyevents()));
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent, raw: bool) -> Option<Message> {
        if raw {
            return Some(Message::RawKey(key));
        }
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::PageUp => Some(Message::ScrollUp),
            KeyCode::PageDown | KeyCode::Char(' ') => Some(Message::ScrollDown),
            KeyCode::Home => Some(Message::ScrollTop),
            KeyCode::End => Some(Message::ScrollBottom),
            KeyCode::Enter => Some(Message::Enter),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Char('y') => Some(Message::EditYear),
            KeyCode::Char('c') => Some(Message::CopySection),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::crossterm::event::{KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_mapping() {
        let controller = Controller::new(&DashboardConfig::default());
        assert_eq!(controller.handle_key(key(KeyCode::Char('q')), false), Some(Message::Quit));
        assert_eq!(controller.handle_key(key(KeyCode::Char('j')), false), Some(Message::MoveDown));
        assert_eq!(controller.handle_key(key(KeyCode::Up), false), Some(Message::MoveUp));
        assert_eq!(controller.handle_key(key(KeyCode::Enter), false), Some(Message::Enter));
        assert_eq!(controller.handle_key(key(KeyCode::Char('y')), false), Some(Message::EditYear));
        assert_eq!(controller.handle_key(key(KeyCode::Char('z')), false), None);
    }

    #[test]
    fn test_raw_mode_forwards_keys() {
        let controller = Controller::new(&DashboardConfig::default());
        let k = key(KeyCode::Char('q'));
        assert_eq!(controller.handle_key(k, true), Some(Message::RawKey(k)));
    }
}
