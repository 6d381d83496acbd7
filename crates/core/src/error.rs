//! Error types for circuit-echo-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial driver error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Invalid link configuration: {0}")]
    InvalidConfig(String),

    #[error("Parity {0} is not supported by the serial driver")]
    UnsupportedParity(crate::link::Parity),

    #[error("Serial link is closed")]
    LinkClosed,

    #[error("Serial link already closed")]
    AlreadyClosed,

    #[error("Read half already taken")]
    ReaderTaken,

    #[error("Queue full: item dropped after {0}ms")]
    QueueFull(u64),

    #[error("Queue closed")]
    QueueClosed,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CoreError>;
