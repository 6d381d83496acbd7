//! Mock link for testing

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::handle::Link;
use crate::{CoreError, Result};

/// Records outbound writes and close calls; failures can be switched on
#[derive(Default)]
pub struct MockLink {
    writes: Mutex<Vec<Vec<u8>>>,
    close_calls: AtomicUsize,
    closed: AtomicBool,
    fail_writes: AtomicBool,
    fail_close: AtomicBool,
}

impl MockLink {
    /// Create new mock link
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make close fail
    pub fn set_fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    /// Every successful write, in order
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of times `close()` was called
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl Link for MockLink {
    fn write(&self, data: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(CoreError::LinkClosed);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(data.to_vec());
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(CoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "mock close failure",
            )));
        }
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(CoreError::AlreadyClosed);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
