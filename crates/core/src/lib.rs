//! Circuit Echo Core - serial data-plane for the terminal client
//!
//! This crate provides:
//! - Link configuration and the serial Link Handle
//! - Bounded event queue with drop-on-timeout producers
//! - Link reader (blocking reads into the serial queue)
//! - Log sink (tracing output into the log queue)
//! - Error types

use std::time::Duration;

/// Serial queue capacity (chunks)
pub const SERIAL_QUEUE_CAPACITY: usize = 1024;
/// How long the link reader waits for queue space before dropping a chunk
pub const SERIAL_SEND_TIMEOUT: Duration = Duration::from_secs(1);
/// Log queue capacity (writes)
pub const LOG_QUEUE_CAPACITY: usize = 1024;
/// How long a log write waits for queue space before it is dropped
pub const LOG_SEND_TIMEOUT: Duration = Duration::from_millis(100);

pub mod display;
pub mod error;
pub mod link;
pub mod log_sink;
pub mod queue;
pub mod reader;

// Re-export common types
pub use error::{CoreError, Result};
pub use link::{Link, LinkConfig, LinkHandle, LinkReadHalf, MockLink, Parity};
pub use log_sink::{LogSink, LogSinkWriter};
pub use queue::{bounded, QueueReceiver, QueueSender};
pub use reader::{run_link_reader, spawn_link_reader, ReaderExit};

/// Serial chunk queue with the standard capacity and timeout
pub fn serial_queue() -> (QueueSender<bytes::Bytes>, QueueReceiver<bytes::Bytes>) {
    bounded(SERIAL_QUEUE_CAPACITY, SERIAL_SEND_TIMEOUT)
}
