//! Log sink: tracing output as a read-only chunk stream
//!
//! Constructed once at startup and handed both to the tracing subscriber
//! (as its writer) and to the presentation loop (as the log event source).
//! Writes never fail. By default a write that finds the queue full is
//! dropped at once, since the thread logging may be the one that drains the
//! queue. Threads opted in with [`allow_waiting_writes`] wait up to the
//! queue's send timeout instead.

use bytes::Bytes;
use std::cell::Cell;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

use crate::queue::{bounded, QueueReceiver, QueueSender};
use crate::{LOG_QUEUE_CAPACITY, LOG_SEND_TIMEOUT};

thread_local! {
    static WAIT_ALLOWED: Cell<bool> = const { Cell::new(false) };
}

/// Let log writes from the calling thread wait for queue space
///
/// Only for threads that may block and never drain the log queue, such as
/// the link reader's `spawn_blocking` thread.
pub fn allow_waiting_writes() {
    WAIT_ALLOWED.with(|allowed| allowed.set(true));
}

/// Bridge from log call sites to a single ordered consumer
pub struct LogSink {
    tx: QueueSender<Bytes>,
    rx: Mutex<Option<QueueReceiver<Bytes>>>,
    dropped: AtomicU64,
}

impl LogSink {
    /// Create a sink with the default log queue settings
    pub fn new() -> Arc<Self> {
        Self::with_capacity(LOG_QUEUE_CAPACITY, LOG_SEND_TIMEOUT)
    }

    /// Create a sink with explicit queue settings
    pub fn with_capacity(capacity: usize, send_timeout: Duration) -> Arc<Self> {
        let (tx, rx) = bounded(capacity, send_timeout);
        Arc::new(Self {
            tx,
            rx: Mutex::new(Some(rx)),
            dropped: AtomicU64::new(0),
        })
    }

    /// Queue one log write
    ///
    /// Always reports the full length as written; a write that cannot be
    /// queued is dropped and counted.
    pub fn write(&self, data: &[u8]) -> usize {
        if data.is_empty() {
            return 0;
        }

        let chunk = Bytes::copy_from_slice(data);
        let result = if WAIT_ALLOWED.with(Cell::get) {
            self.tx.blocking_send(chunk)
        } else {
            self.tx.try_send(chunk)
        };
        if result.is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        data.len()
    }

    /// Take the receiving end (first call only)
    pub fn subscribe(&self) -> Option<QueueReceiver<Bytes>> {
        self.rx.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Number of writes dropped so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Writer handle for `tracing_subscriber::fmt`
    pub fn writer(self: &Arc<Self>) -> LogSinkWriter {
        LogSinkWriter {
            sink: self.clone(),
        }
    }
}

/// `io::Write` / `MakeWriter` adapter over a shared [`LogSink`]
#[derive(Clone)]
pub struct LogSinkWriter {
    sink: Arc<LogSink>,
}

impl io::Write for LogSinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.sink.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogSinkWriter {
    type Writer = LogSinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Instant;
    use tracing_subscriber::fmt;

    #[tokio::test]
    async fn test_write_then_receive() {
        let sink = LogSink::new();
        let mut rx = sink.subscribe().unwrap();

        assert_eq!(sink.write(b"INFO hello\n"), 11);
        assert_eq!(rx.recv().await, Some(Bytes::from_static(b"INFO hello\n")));
    }

    #[test]
    fn test_subscribe_once() {
        let sink = LogSink::new();
        assert!(sink.subscribe().is_some());
        assert!(sink.subscribe().is_none());
    }

    #[test]
    fn test_full_sink_drops_without_error() {
        let sink = LogSink::with_capacity(1, Duration::from_millis(20));
        let _rx = sink.subscribe().unwrap();

        assert_eq!(sink.write(b"first"), 5);
        let started = Instant::now();
        assert_eq!(sink.write(b"second"), 6);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(sink.dropped(), 1);
    }

    #[tokio::test]
    async fn test_write_on_runtime_thread_never_waits() {
        let sink = LogSink::with_capacity(2, Duration::from_millis(500));
        let mut rx = sink.subscribe().unwrap();

        let started = Instant::now();
        for _ in 0..5 {
            assert_eq!(sink.write(b"line\n"), 5);
        }
        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(sink.dropped(), 3);

        // Queued writes are intact and in order
        assert_eq!(rx.recv().await, Some(Bytes::from_static(b"line\n")));
        assert_eq!(rx.recv().await, Some(Bytes::from_static(b"line\n")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_opted_in_thread_waits_for_space() {
        let sink = LogSink::with_capacity(1, Duration::from_secs(5));
        let mut rx = sink.subscribe().unwrap();
        sink.write(b"first");

        let writer = {
            let sink = sink.clone();
            tokio::task::spawn_blocking(move || {
                allow_waiting_writes();
                sink.write(b"second")
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rx.recv().await, Some(Bytes::from_static(b"first")));
        assert_eq!(writer.await.unwrap(), 6);
        assert_eq!(rx.recv().await, Some(Bytes::from_static(b"second")));
        assert_eq!(sink.dropped(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_opted_in_thread_drops_after_timeout() {
        let sink = LogSink::with_capacity(1, Duration::from_millis(30));
        let _rx = sink.subscribe().unwrap();
        sink.write(b"first");

        let writer = {
            let sink = sink.clone();
            tokio::task::spawn_blocking(move || {
                allow_waiting_writes();
                let started = Instant::now();
                sink.write(b"second");
                started.elapsed()
            })
        };

        assert!(writer.await.unwrap() >= Duration::from_millis(30));
        assert_eq!(sink.dropped(), 1);
    }

    #[test]
    fn test_write_without_subscriber_never_fails() {
        let sink = LogSink::with_capacity(1, Duration::from_millis(5));
        drop(sink.subscribe());

        let mut writer = sink.writer();
        assert!(writer.write_all(b"nobody listening").is_ok());
        assert_eq!(sink.dropped(), 1);
    }

    #[tokio::test]
    async fn test_tracing_events_reach_sink() {
        let sink = LogSink::new();
        let mut rx = sink.subscribe().unwrap();

        let subscriber = fmt()
            .with_writer(sink.writer())
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("link is quiet");
        });

        let chunk = rx.recv().await.unwrap();
        let line = String::from_utf8_lossy(&chunk);
        assert!(line.contains("WARN"));
        assert!(line.contains("link is quiet"));
    }
}
