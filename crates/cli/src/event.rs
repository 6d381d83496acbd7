//! Events handled by the presentation loop

use bytes::Bytes;
use crossterm::event::{Event, KeyEvent, KeyEventKind};

/// One event from any of the loop's sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Terminal window resized
    Resize { width: u16, height: u16 },
    /// Key press
    Key(KeyEvent),
    /// One chunk read from the serial link
    Serial(Bytes),
    /// One formatted log write
    Log(Bytes),
}

impl AppEvent {
    /// Translate a terminal event; events the loop has no use for map to `None`
    pub fn from_terminal(event: Event) -> Option<Self> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Some(AppEvent::Key(key)),
            Event::Resize(width, height) => Some(AppEvent::Resize { width, height }),
            _ => None,
        }
    }
}
