use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyCode};
use tracing::trace;

use crate::domain::{CtvConfig, CtvError, Message};
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
    time_week_step: usize,
}

impl Controller {
    pub fn new(cfg: &CtvConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
            time_week_step: cfg.time_week_step,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, CtvError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    // While the filter input line is active, keys go to the
                    // line editor unmapped.
                    if model.raw_keyevents() {
                        return Ok(Some(Message::RawKey(key)));
                    }
                    return Ok(self.handle_key(key));
                }
                Event::Resize(width, height) => {
                    return Ok(Some(Message::Resize(
                        width as usize,
                        height as usize,
                    )));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Left | KeyCode::Char('h') => Some(Message::MoveLeft),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::MoveRight),
            KeyCode::PageUp => Some(Message::MovePageUp),
            KeyCode::PageDown => Some(Message::MovePageDown),
            KeyCode::Char('g') => Some(Message::MoveBeginning),
            KeyCode::Char('G') => Some(Message::MoveEnd),
            KeyCode::Char('0') => Some(Message::MoveToFirstColumn),
            KeyCode::Char('$') => Some(Message::MoveToLastColumn),
            KeyCode::Char('s') => Some(Message::SortAscending),
            KeyCode::Char('S') => Some(Message::SortDescending),
            KeyCode::Char('f') => Some(Message::Filter),
            KeyCode::Char('r') => Some(Message::ResetFilters),
            KeyCode::Char('[') => Some(Message::TimeBack(1)),
            KeyCode::Char(']') => Some(Message::TimeForward(1)),
            KeyCode::Char('{') => Some(Message::TimeBack(self.time_week_step)),
            KeyCode::Char('}') => {
                Some(Message::TimeForward(self.time_week_step))
            }
            KeyCode::Char('i') => Some(Message::ToggleIndex),
            KeyCode::Char('y') => Some(Message::CopyCell),
            KeyCode::Char('Y') => Some(Message::CopyRow),
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

    fn controller() -> Controller {
        Controller::new(&CtvConfig::default())
    }

    #[test]
    fn maps_the_time_keys_to_curser_steps() {
        let c = controller();
        assert!(matches!(
            c.handle_key(KeyEvent::from(KeyCode::Char('['))),
            Some(Message::TimeBack(1))
        ));
        assert!(matches!(
            c.handle_key(KeyEvent::from(KeyCode::Char('}'))),
            Some(Message::TimeForward(7))
        ));
    }

    #[test]
    fn maps_sort_and_filter_keys() {
        let c = controller();
        assert!(matches!(
            c.handle_key(KeyEvent::from(KeyCode::Char('s'))),
            Some(Message::SortAscending)
        ));
        assert!(matches!(
            c.handle_key(KeyEvent::from(KeyCode::Char('S'))),
            Some(Message::SortDescending)
        ));
        assert!(matches!(
            c.handle_key(KeyEvent::from(KeyCode::Char('f'))),
            Some(Message::Filter)
        ));
        assert!(matches!(
            c.handle_key(KeyEvent::from(KeyCode::Char('r'))),
            Some(Message::ResetFilters)
        ));
    }

    #[test]
    fn unmapped_keys_produce_no_message() {
        let c = controller();
        assert!(c.handle_key(KeyEvent::from(KeyCode::Char('x'))).is_none());
    }
}
