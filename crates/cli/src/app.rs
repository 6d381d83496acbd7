//! View state and event dispatch for the presentation loop
//!
//! `App` is owned by the loop alone. Every event goes through
//! [`App::handle`], which updates the state and says whether to keep going.

use std::sync::Arc;

use circuit_echo_core::display::{hex_bytes, lossy_text, Utf8Stream};
use circuit_echo_core::Link;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::event::AppEvent;
use crate::widgets::{InputBox, ScrollView};

/// Rows taken by titles, borders, input box and help line
const CHROME_ROWS: u16 = 11;
/// Rows moved from the log view to the serial view
const SERIAL_EXTRA_ROWS: u16 = 5;

/// Which element receives keyboard input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Serial,
    Log,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Input => Focus::Serial,
            Focus::Serial => Focus::Log,
            Focus::Log => Focus::Input,
        }
    }
}

/// What the loop does after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub struct App {
    serial: ScrollView,
    /// Carries a character split across serial reads
    serial_text: Utf8Stream,
    log: ScrollView,
    input: InputBox,
    focus: Focus,
    link: Option<Arc<dyn Link>>,
    cancel: CancellationToken,
    label: String,
}

impl App {
    pub fn new(link: Option<Arc<dyn Link>>, cancel: CancellationToken, label: impl Into<String>) -> Self {
        let mut input = InputBox::new(50);
        input.focus();

        Self {
            serial: ScrollView::new(50, 20),
            serial_text: Utf8Stream::new(),
            log: ScrollView::new(50, 20),
            input,
            focus: Focus::Input,
            link,
            cancel,
            label: label.into(),
        }
    }

    pub fn serial(&self) -> &ScrollView {
        &self.serial
    }

    pub fn log(&self) -> &ScrollView {
        &self.log
    }

    pub fn input(&self) -> &InputBox {
        &self.input
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Link description shown in the serial title
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn handle(&mut self, event: AppEvent) -> Control {
        match event {
            AppEvent::Resize { width, height } => {
                self.resize(width, height);
                Control::Continue
            }
            AppEvent::Key(key) if is_quit(&key) => self.quit(),
            AppEvent::Key(key) if key.code == KeyCode::Tab => {
                self.cycle_focus();
                Control::Continue
            }
            AppEvent::Key(key) if key.code == KeyCode::Enter => {
                self.submit();
                Control::Continue
            }
            AppEvent::Key(key) => {
                self.forward(&key);
                Control::Continue
            }
            AppEvent::Serial(chunk) => {
                self.serial.push_str(&self.serial_text.decode(&chunk));
                self.serial.goto_bottom();
                info!("Serial Data: {}", hex_bytes(&chunk));
                Control::Continue
            }
            AppEvent::Log(chunk) => {
                self.log.push_str(&lossy_text(&chunk));
                self.log.goto_bottom();
                Control::Continue
            }
        }
    }

    /// Close the link (if any) and stop the loop
    ///
    /// The reader is only cancelled when the close succeeded; a failed
    /// close is logged and never blocks the quit.
    pub fn quit(&mut self) -> Control {
        let Some(link) = self.link.as_ref() else {
            return Control::Quit;
        };

        match link.close() {
            Ok(()) => self.cancel.cancel(),
            Err(e) => error!("Failed to close serial port: {}", e),
        }
        Control::Quit
    }

    fn resize(&mut self, width: u16, height: u16) {
        let view_height = height.saturating_sub(CHROME_ROWS) / 2;
        let view_width = width.saturating_sub(2);

        self.log
            .set_size(view_width, view_height.saturating_sub(SERIAL_EXTRA_ROWS));
        self.serial.set_size(view_width, view_height + SERIAL_EXTRA_ROWS);
        self.input.set_width(view_width.saturating_sub(3));
    }

    fn cycle_focus(&mut self) {
        self.focus = self.focus.next();
        if self.focus == Focus::Input {
            self.input.focus();
        } else {
            self.input.blur();
        }
    }

    fn submit(&mut self) {
        if self.focus != Focus::Input || self.input.is_empty() {
            return;
        }

        let line = format!("{}\r\n", self.input.value());

        let Some(link) = self.link.as_ref() else {
            error!("Serial port is not open, please restart the application");
            return;
        };

        if let Err(e) = link.write(line.as_bytes()) {
            error!("Failed to write to serial port: {}", e);
            return;
        }

        self.serial.push_str(&format!("> {}", line));
        self.serial.goto_bottom();
        self.input.clear();
    }

    fn forward(&mut self, key: &KeyEvent) {
        match self.focus {
            Focus::Input => self.input.handle_key(key),
            Focus::Serial => self.serial.handle_key(key),
            Focus::Log => self.log.handle_key(key),
        }
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
