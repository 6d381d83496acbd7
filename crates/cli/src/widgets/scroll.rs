//! Scrollable transcript view
//!
//! Owns an append-only transcript and a vertical offset into it.
//! No wrapping: lines wider than the view are clipped on render.

use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, Clone)]
pub struct ScrollView {
    content: String,
    /// Byte offset where each line starts; always holds at least `0`
    line_starts: Vec<usize>,
    width: u16,
    height: u16,
    y_offset: usize,
}

impl ScrollView {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            content: String::new(),
            line_starts: vec![0],
            width: width.max(1),
            height: height.max(1),
            y_offset: 0,
        }
    }

    /// Append to the transcript
    pub fn push_str(&mut self, text: &str) {
        let base = self.content.len();
        self.line_starts
            .extend(text.match_indices('\n').map(|(i, _)| base + i + 1));
        self.content.push_str(text);
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn y_offset(&self) -> usize {
        self.y_offset
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.y_offset = self.y_offset.min(self.max_offset());
    }

    /// Lines in the transcript; a trailing newline does not open a new line
    pub fn line_count(&self) -> usize {
        let newlines = self.line_starts.len() - 1;
        if self.content.is_empty() || self.content.ends_with('\n') {
            newlines
        } else {
            newlines + 1
        }
    }

    fn max_offset(&self) -> usize {
        self.line_count().saturating_sub(self.height as usize)
    }

    pub fn at_bottom(&self) -> bool {
        self.y_offset >= self.max_offset()
    }

    pub fn goto_bottom(&mut self) {
        self.y_offset = self.max_offset();
    }

    pub fn goto_top(&mut self) {
        self.y_offset = 0;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.y_offset = self.y_offset.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.y_offset = (self.y_offset + lines).min(self.max_offset());
    }

    /// Navigation keys
    pub fn handle_key(&mut self, key: &KeyEvent) {
        let page = self.height as usize;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::PageUp | KeyCode::Char('b') => self.scroll_up(page),
            KeyCode::PageDown | KeyCode::Char('f') | KeyCode::Char(' ') => {
                self.scroll_down(page)
            }
            KeyCode::Home | KeyCode::Char('g') => self.goto_top(),
            KeyCode::End | KeyCode::Char('G') => self.goto_bottom(),
            _ => {}
        }
    }

    /// Lines currently in view, stripped of control characters
    pub fn visible_lines(&self) -> Vec<String> {
        let first = self.y_offset.min(self.line_starts.len());
        let last = (first + self.height as usize).min(self.line_starts.len());

        (first..last)
            .map(|i| {
                let start = self.line_starts[i];
                let end = self
                    .line_starts
                    .get(i + 1)
                    .map_or(self.content.len(), |next| next - 1);
                sanitize_line(&self.content[start..end])
            })
            .collect()
    }
}

/// Drop carriage returns and other control characters; expand tabs
fn sanitize_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\t' => out.push_str("    "),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
