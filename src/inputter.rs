use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// A single line editor for the command line at the bottom of the screen.
pub struct Inputter {
    current_input: String,
    cursor_pos: usize,
    max_len: usize,
    accept: fn(char) -> bool,
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub cursor_pos: usize,
}

impl Default for Inputter {
    fn default() -> Self {
        Self {
            current_input: String::new(),
            cursor_pos: 0,
            max_len: usize::MAX,
            accept: |_| true,
            finished: false,
            canceled: false,
        }
    }
}

impl Inputter {
    /// An editor that only takes up to `max_len` ascii digits.
    pub fn numeric(max_len: usize) -> Self {
        Self {
            max_len,
            accept: |c| c.is_ascii_digit(),
            ..Self::default()
        }
    }

    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => self.enter(),
            (KeyCode::Esc, KeyModifiers::NONE) => self.escape(),
            (KeyCode::Backspace, KeyModifiers::NONE) => self.backspace(),
            (KeyCode::Left, KeyModifiers::NONE) => self.left(),
            (KeyCode::Right, KeyModifiers::NONE) => self.right(),
            (kc, _) => self.key(kc),
        }
    }

    pub fn set(&mut self, s: &str) {
        self.current_input = s.chars().filter(|c| (self.accept)(*c)).take(self.max_len).collect();
        self.cursor_pos = self.current_input.chars().count();
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            cursor_pos: self.cursor_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.cursor_pos = 0;
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
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let idx = self.byte_pos();
            self.current_input.remove(idx);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.cursor_pos < self.current_input.chars().count() {
            self.cursor_pos += 1;
        }
        self.get()
    }

    fn key(&mut self, code: KeyCode) -> InputResult {
        match code.as_char() {
            Some(chr)
                if (self.accept)(chr) && self.current_input.chars().count() < self.max_len =>
            {
                let idx = self.byte_pos();
                self.current_input.insert(idx, chr);
                self.cursor_pos += 1;
            }
            other => trace!("Ignored input {other:?}"),
        }
        self.get()
    }

    fn byte_pos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.cursor_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}
