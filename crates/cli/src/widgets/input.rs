//! Single-line text input with a cursor

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Maximum characters accepted in the input box
pub const CHAR_LIMIT: usize = 256;

pub const PLACEHOLDER: &str = "Type your message and press Enter to send...";

/// Text input state; cursor is a character index
#[derive(Debug, Clone)]
pub struct InputBox {
    chars: Vec<char>,
    cursor: usize,
    focused: bool,
    width: u16,
}

impl InputBox {
    pub fn new(width: u16) -> Self {
        Self {
            chars: Vec::new(),
            cursor: 0,
            focused: false,
            width: width.max(1),
        }
    }

    pub fn value(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn set_value(&mut self, value: &str) {
        self.chars = value.chars().take(CHAR_LIMIT).collect();
        self.cursor = self.chars.len();
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn set_width(&mut self, width: u16) {
        self.width = width.max(1);
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Editing keys; ignored while blurred
    pub fn handle_key(&mut self, key: &KeyEvent) {
        if !self.focused {
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.chars.len(),
            KeyCode::Char('u') if ctrl => {
                self.chars.drain(..self.cursor);
                self.cursor = 0;
            }
            KeyCode::Char('k') if ctrl => {
                self.chars.truncate(self.cursor);
            }
            KeyCode::Char(c)
                if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) =>
            {
                if self.chars.len() < CHAR_LIMIT {
                    self.chars.insert(self.cursor, c);
                    self.cursor += 1;
                }
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.chars.remove(self.cursor);
            }
            KeyCode::Delete if self.cursor < self.chars.len() => {
                self.chars.remove(self.cursor);
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.chars.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.chars.len(),
            _ => {}
        }
    }

    /// Text that fits the box, and the cursor column inside it
    ///
    /// Scrolls horizontally so the cursor stays visible.
    pub fn visible(&self) -> (String, u16) {
        let width = self.width as usize;
        let offset = (self.cursor + 1).saturating_sub(width);
        let text = self.chars.iter().skip(offset).take(width).collect();
        (text, (self.cursor - offset) as u16)
    }
}
