//! Presentation loop
//!
//! Waits on three sources at once (terminal events, serial chunks, log
//! chunks), dispatches whichever is ready first, and draws a frame after
//! every event. Each queue has exactly one pending wait at a time; a queue
//! whose producers are gone is dropped from the wait set and the loop keeps
//! serving the others.

use std::io;

use anyhow::Result;
use bytes::Bytes;
use circuit_echo_core::QueueReceiver;
use crossterm::event::Event;
use futures::{Stream, StreamExt};
use ratatui::backend::Backend;
use ratatui::Terminal;
use tracing::{error, warn};

use crate::app::{App, Control};
use crate::event::AppEvent;
use crate::ui;

pub async fn run<B, S>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut events: S,
    mut serial_rx: QueueReceiver<Bytes>,
    mut log_rx: QueueReceiver<Bytes>,
) -> Result<()>
where
    B: Backend,
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    let size = terminal.size()?;
    app.handle(AppEvent::Resize {
        width: size.width,
        height: size.height,
    });
    terminal.draw(|frame| ui::render(frame, app))?;

    let mut serial_open = true;
    let mut log_open = true;

    loop {
        let event = tokio::select! {
            next = events.next() => match next {
                Some(Ok(event)) => match AppEvent::from_terminal(event) {
                    Some(event) => event,
                    None => continue,
                },
                Some(Err(e)) => {
                    error!("Terminal input error: {}", e);
                    app.quit();
                    break;
                }
                None => {
                    app.quit();
                    break;
                }
            },
            chunk = serial_rx.recv(), if serial_open => match chunk {
                Some(chunk) => AppEvent::Serial(chunk),
                None => {
                    serial_open = false;
                    warn!("Serial source closed, no further data will arrive");
                    continue;
                }
            },
            chunk = log_rx.recv(), if log_open => match chunk {
                Some(chunk) => AppEvent::Log(chunk),
                None => {
                    log_open = false;
                    continue;
                }
            },
        };

        let control = app.handle(event);
        terminal.draw(|frame| ui::render(frame, app))?;

        if control == Control::Quit {
            break;
        }
    }

    Ok(())
}
