use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, RVConfig, RVError};
use ratatui::crossterm::event::{self, Event, KeyCode};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &RVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self) -> Result<Option<Message>, RVError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                // crossterm also emits key release and repeat events on Windows.
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    return Ok(self.handle_key(key));
                }
                Event::Resize(width, height) => {
                    return Ok(Some(Message::Resize(width as usize, height as usize)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    pub fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('r') => Some(Message::Reload),
            KeyCode::Char('x') => Some(Message::Reset),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Left | KeyCode::Char('h') => Some(Message::MoveLeft),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::MoveRight),
            KeyCode::PageUp => Some(Message::MovePageUp),
            KeyCode::PageDown => Some(Message::MovePageDown),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    #[test]
    fn maps_keys_to_messages() {
        let controller = Controller::new(&RVConfig::default());
        let map = |code: KeyCode| controller.handle_key(KeyEvent::from(code));
        assert_eq!(map(KeyCode::Char('q')), Some(Message::Quit));
        assert_eq!(map(KeyCode::Char('r')), Some(Message::Reload));
        assert_eq!(map(KeyCode::Char('x')), Some(Message::Reset));
        assert_eq!(map(KeyCode::Right), Some(Message::MoveRight));
        assert_eq!(map(KeyCode::PageDown), Some(Message::MovePageDown));
        assert_eq!(map(KeyCode::Char('z')), None);
    }
}
