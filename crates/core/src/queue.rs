//! Bounded event queue with drop-on-timeout producers
//!
//! A bounded `tokio::sync::mpsc` channel between producer contexts and one
//! async consumer. Producers wait at most a fixed timeout for space, then
//! drop the item; the consumer suspends until exactly one item is available.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{CoreError, Result};

/// Create a bounded queue
///
/// # Arguments
/// * `capacity` - Maximum number of queued items (at least 1)
/// * `send_timeout` - How long a producer waits for space before dropping
pub fn bounded<T>(capacity: usize, send_timeout: Duration) -> (QueueSender<T>, QueueReceiver<T>) {
    let capacity = capacity.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    (
        QueueSender { tx, send_timeout },
        QueueReceiver { rx, capacity },
    )
}

/// Producer half of a bounded queue
pub struct QueueSender<T> {
    tx: mpsc::Sender<T>,
    send_timeout: Duration,
}

impl<T> QueueSender<T> {
    /// Enqueue an item, waiting up to the send timeout for space
    ///
    /// Returns `CoreError::QueueFull` when the timeout elapses; the item is
    /// dropped and nothing already queued is touched. Returns
    /// `CoreError::QueueClosed` when the receiver is gone.
    pub async fn send(&self, item: T) -> Result<()> {
        match tokio::time::timeout(self.send_timeout, self.tx.send(item)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(CoreError::QueueClosed),
            Err(_) => Err(CoreError::QueueFull(self.send_timeout.as_millis() as u64)),
        }
    }

    /// Enqueue without waiting; a full queue drops the item at once
    pub fn try_send(&self, item: T) -> Result<()> {
        match self.tx.try_send(item) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(CoreError::QueueFull(0)),
            Err(TrySendError::Closed(_)) => Err(CoreError::QueueClosed),
        }
    }

    /// [`send`](Self::send) for synchronous producers
    ///
    /// For threads that may block, such as `spawn_blocking` workers. Must not
    /// be called from inside an async task. On a thread with no runtime
    /// context there is no timer to wait on, so a full queue drops at once.
    pub fn blocking_send(&self, item: T) -> Result<()> {
        let item = match self.tx.try_send(item) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Closed(_)) => return Err(CoreError::QueueClosed),
            Err(TrySendError::Full(item)) => item,
        };

        match Handle::try_current() {
            Ok(handle) => handle.block_on(self.send(item)),
            Err(_) => Err(CoreError::QueueFull(0)),
        }
    }

    /// Configured producer timeout
    #[inline]
    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Check if the receiver has been dropped
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            send_timeout: self.send_timeout,
        }
    }
}

/// Consumer half of a bounded queue
///
/// Not `Clone`: exactly one reader exists per queue.
pub struct QueueReceiver<T> {
    rx: mpsc::Receiver<T>,
    capacity: usize,
}

impl<T> QueueReceiver<T> {
    /// Wait for the next item
    ///
    /// Returns `None` once every sender is gone and the queue is drained.
    /// Cancel-safe: an item is only removed when this future completes.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Check if the queue holds no items
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Queue capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
