//! Serial link lifecycle: open, read, write, close
//!
//! The handle is shared by two contexts. The reader thread owns a cloned
//! driver handle (the read half) so a blocked read never holds a lock the
//! writer needs; both halves share a closed flag so a read issued after
//! `close()` fails instead of touching a released link.

use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::config::{
    to_serialport_data_bits, to_serialport_parity, to_serialport_stop_bits, LinkConfig,
};
use crate::{CoreError, Result};

/// Driver read timeout; bounds how long an in-flight read delays shutdown
pub const READ_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Outbound side of a serial link, as seen by the presentation loop
pub trait Link: Send + Sync {
    /// Write all bytes to the link
    fn write(&self, data: &[u8]) -> Result<()>;

    /// Close the link; a second call returns `CoreError::AlreadyClosed`
    fn close(&self) -> Result<()>;

    /// Whether `close()` has been called
    fn is_closed(&self) -> bool;
}

type BoxedReader = Box<dyn Read + Send>;
type BoxedWriter = Box<dyn Write + Send>;

/// Open serial connection
pub struct LinkHandle {
    name: String,
    writer: Mutex<Option<BoxedWriter>>,
    reader: Mutex<Option<BoxedReader>>,
    closed: Arc<AtomicBool>,
}

impl LinkHandle {
    /// Open the serial port described by `config`
    pub fn open(config: &LinkConfig) -> Result<Self> {
        config.validate()?;

        let parity = to_serialport_parity(config.parity)?;
        let data_bits = to_serialport_data_bits(config.data_bits)?;
        let stop_bits = to_serialport_stop_bits(config.stop_bits)?;

        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(parity)
            .timeout(READ_POLL_TIMEOUT)
            .open()?;
        let reader = port.try_clone()?;

        tracing::info!("Opened serial link {}", config.summary());
        Ok(Self::from_parts(config.port.clone(), reader, port))
    }

    /// Build a handle from an already-open reader/writer pair
    pub fn from_parts(
        name: impl Into<String>,
        reader: impl Read + Send + 'static,
        writer: impl Write + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            writer: Mutex::new(Some(Box::new(writer))),
            reader: Mutex::new(Some(Box::new(reader))),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Port name this handle was opened on
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hand the read half to the reader context (once)
    pub fn take_reader(&self) -> Result<LinkReadHalf> {
        if self.is_closed() {
            return Err(CoreError::LinkClosed);
        }
        let inner = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(CoreError::ReaderTaken)?;

        Ok(LinkReadHalf {
            inner,
            closed: self.closed.clone(),
        })
    }
}

impl Link for LinkHandle {
    fn write(&self, data: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(CoreError::LinkClosed);
        }
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let writer = guard.as_mut().ok_or(CoreError::LinkClosed)?;
        writer.write_all(data)?;
        writer.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(CoreError::AlreadyClosed);
        }

        // An untaken read half goes with the link
        self.reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let writer = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut writer) = writer {
            writer.flush()?;
        }

        tracing::debug!("Closed serial link {}", self.name);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Read half of a link, owned by the reader context
pub struct LinkReadHalf {
    inner: BoxedReader,
    closed: Arc<AtomicBool>,
}

impl LinkReadHalf {
    /// Blocking read of up to `buf.len()` bytes
    ///
    /// A driver read timeout is reported as `Ok(0)`. Fails with
    /// `CoreError::LinkClosed` once the owning handle has been closed.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CoreError::LinkClosed);
        }
        match self.inner.read(buf) {
            Ok(n) => Ok(n),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    struct SharedWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "device gone"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct TimeoutReader;

    impl Read for TimeoutReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::TimedOut, "timed out"))
        }
    }

    fn handle_with_sink() -> (LinkHandle, Arc<Mutex<Vec<u8>>>) {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let handle = LinkHandle::from_parts(
            "mock0",
            Cursor::new(b"ping".to_vec()),
            SharedWriter(sink.clone()),
        );
        (handle, sink)
    }

    #[test]
    fn test_write_reaches_writer() {
        let (handle, sink) = handle_with_sink();
        handle.write(b"hello\r\n").unwrap();
        assert_eq!(sink.lock().unwrap().as_slice(), b"hello\r\n");
        assert_eq!(handle.name(), "mock0");
    }

    #[test]
    fn test_write_error_surfaces() {
        let handle = LinkHandle::from_parts("mock0", io::empty(), FailingWriter);
        assert!(matches!(handle.write(b"x"), Err(CoreError::Io(_))));
    }

    #[test]
    fn test_read_half_taken_once() {
        let (handle, _) = handle_with_sink();
        let mut half = handle.take_reader().unwrap();
        assert!(matches!(handle.take_reader(), Err(CoreError::ReaderTaken)));

        let mut buf = [0u8; 16];
        let n = half.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");
    }

    #[test]
    fn test_read_timeout_is_zero_bytes() {
        let handle = LinkHandle::from_parts("mock0", TimeoutReader, io::sink());
        let mut half = handle.take_reader().unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(half.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_close_once() {
        let (handle, _) = handle_with_sink();
        assert!(!handle.is_closed());
        handle.close().unwrap();
        assert!(handle.is_closed());
        assert!(matches!(handle.close(), Err(CoreError::AlreadyClosed)));
    }

    #[test]
    fn test_io_after_close_is_error() {
        let (handle, _) = handle_with_sink();
        let mut half = handle.take_reader().unwrap();
        handle.close().unwrap();

        assert!(matches!(handle.write(b"x"), Err(CoreError::LinkClosed)));
        let mut buf = [0u8; 4];
        assert!(matches!(half.read(&mut buf), Err(CoreError::LinkClosed)));
        assert!(matches!(handle.take_reader(), Err(CoreError::LinkClosed)));
    }

    #[test]
    fn test_close_concurrent_with_reader_thread() {
        let handle = Arc::new(LinkHandle::from_parts("mock0", TimeoutReader, io::sink()));
        let mut half = handle.take_reader().unwrap();

        let reader = std::thread::spawn(move || {
            let mut buf = [0u8; 8];
            loop {
                match half.read(&mut buf) {
                    Ok(_) => std::thread::sleep(Duration::from_millis(1)),
                    Err(e) => return e,
                }
            }
        });

        std::thread::sleep(Duration::from_millis(20));
        handle.close().unwrap();
        let err = reader.join().unwrap();
        assert!(matches!(err, CoreError::LinkClosed));
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        use crate::link::Parity;

        let cfg = LinkConfig::new("/dev/null-port", 0, 8, 1, Parity::None);
        assert!(matches!(LinkHandle::open(&cfg), Err(CoreError::InvalidConfig(_))));

        let cfg = LinkConfig::new("/dev/null-port", 9600, 8, 1, Parity::Mark);
        assert!(matches!(
            LinkHandle::open(&cfg),
            Err(CoreError::UnsupportedParity(Parity::Mark))
        ));
    }
}
