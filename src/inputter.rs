use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

/// Minimal line editor for the filter input line. Enter commits, Escape
/// cancels; the model decides what to do with the committed text.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub curser_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => self.enter(),
            (KeyCode::Esc, KeyModifiers::NONE) => self.escape(),
            (KeyCode::Backspace, KeyModifiers::NONE) => self.backspace(),
            (KeyCode::Delete, KeyModifiers::NONE) => self.delete(),
            (KeyCode::Left, KeyModifiers::NONE) => self.left(),
            (KeyCode::Right, KeyModifiers::NONE) => self.right(),
            (KeyCode::Home, KeyModifiers::NONE) => self.home(),
            (KeyCode::End, KeyModifiers::NONE) => self.end(),
            (kc, km) => self.key(kc, km),
        }
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            curser_pos: self.curser_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.clear();
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            let pos = self.getbytepos();
            self.current_input.remove(pos);
        }
        self.get()
    }

    fn delete(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            let pos = self.getbytepos();
            self.current_input.remove(pos);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.curser_pos = self.curser_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            self.curser_pos += 1;
        }
        self.get()
    }

    fn home(&mut self) -> InputResult {
        self.curser_pos = 0;
        self.get()
    }

    fn end(&mut self) -> InputResult {
        self.curser_pos = self.current_input.chars().count();
        self.get()
    }

    fn key(&mut self, code: KeyCode, _modifier: KeyModifiers) -> InputResult {
        if let Some(chr) = code.as_char() {
            let pos = self.getbytepos();
            self.current_input.insert(pos, chr);
            self.curser_pos += 1;
        }
        self.get()
    }

    fn getbytepos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn type_str(inputter: &mut Inputter, s: &str) {
        for c in s.chars() {
            inputter.read(KeyEvent::from(KeyCode::Char(c)));
        }
    }

    #[test]
    fn typing_and_committing() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "Paris");
        let result = inputter.read(KeyEvent::from(KeyCode::Enter));
        assert_eq!(result.input, "Paris");
        assert!(result.finished);
        assert!(!result.canceled);
    }

    #[test]
    fn escape_cancels_and_drops_the_input() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "Par");
        let result = inputter.read(KeyEvent::from(KeyCode::Esc));
        assert!(result.finished);
        assert!(result.canceled);
        assert_eq!(result.input, "");
    }

    #[test]
    fn backspace_removes_before_the_curser() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "abc");
        inputter.read(KeyEvent::from(KeyCode::Left));
        let result = inputter.read(KeyEvent::from(KeyCode::Backspace));
        assert_eq!(result.input, "ac");
        assert_eq!(result.curser_pos, 1);
    }

    #[test]
    fn delete_removes_at_the_curser() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "abc");
        inputter.read(KeyEvent::from(KeyCode::Home));
        let result = inputter.read(KeyEvent::from(KeyCode::Delete));
        assert_eq!(result.input, "bc");
        assert_eq!(result.curser_pos, 0);
    }

    #[test]
    fn insertion_happens_at_the_curser() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "Pris");
        for _ in 0..3 {
            inputter.read(KeyEvent::from(KeyCode::Left));
        }
        let result = inputter.read(KeyEvent::from(KeyCode::Char('a')));
        assert_eq!(result.input, "Paris");
        assert_eq!(result.curser_pos, 2);
    }
}
