//! Link reader: blocking serial reads feeding the serial queue
//!
//! Runs on `spawn_blocking` because the driver read is blocking.
//! Cancellation is only observed between reads; the driver read timeout
//! bounds how long an in-flight read can delay shutdown.

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::link::LinkReadHalf;
use crate::queue::QueueSender;
use crate::{CoreError, Result};

/// Maximum bytes per read (and per chunk)
pub const READ_CHUNK_SIZE: usize = 1024;

/// How a reader loop finished without a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    /// Cancellation signal observed between reads
    Cancelled,
    /// The link was closed underneath the reader
    LinkClosed,
    /// Nobody is consuming serial chunks any more
    ConsumerGone,
}

/// Read from the link until cancelled, closed, or a read fails
///
/// A read error is fatal: it is logged together with a restart notice and
/// returned. Chunks that do not fit in the queue within its timeout are
/// dropped with a warning. Call from a blocking thread, never from inside
/// an async task.
pub fn run_link_reader(
    mut link: LinkReadHalf,
    tx: QueueSender<Bytes>,
    cancel: CancellationToken,
) -> Result<ReaderExit> {
    let mut buf = [0u8; READ_CHUNK_SIZE];

    loop {
        if cancel.is_cancelled() {
            tracing::info!("Serial reader stopping");
            return Ok(ReaderExit::Cancelled);
        }

        let n = match link.read(&mut buf) {
            Ok(n) => n,
            Err(CoreError::LinkClosed) => {
                tracing::info!("Serial reader stopping: link closed");
                return Ok(ReaderExit::LinkClosed);
            }
            Err(e) => {
                tracing::error!("Error reading from serial port: {}", e);
                tracing::error!("Please restart the application to recover.");
                return Err(e);
            }
        };

        if n == 0 {
            continue;
        }

        match tx.blocking_send(Bytes::copy_from_slice(&buf[..n])) {
            Ok(()) => tracing::trace!("Serial chunk queued: {} bytes", n),
            Err(CoreError::QueueFull(_)) => {
                tracing::warn!("Serial data channel is full, dropping data");
            }
            Err(_) => {
                tracing::debug!("Serial data channel closed, reader stopping");
                return Ok(ReaderExit::ConsumerGone);
            }
        }
    }
}

/// Spawn the reader on a blocking thread and log how it ended
pub fn spawn_link_reader(
    link: LinkReadHalf,
    tx: QueueSender<Bytes>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let reader = tokio::task::spawn_blocking(move || {
        crate::log_sink::allow_waiting_writes();
        run_link_reader(link, tx, cancel)
    });

    tokio::spawn(async move {
        match reader.await {
            Ok(Ok(exit)) => tracing::debug!("Serial reader task completed: {:?}", exit),
            Ok(Err(e)) => tracing::debug!("Serial reader task ended with error: {}", e),
            Err(e) => tracing::error!("Serial reader task panicked: {}", e),
        }
    })
}
