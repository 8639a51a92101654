//! Byte-counting sink.
//!
//! A metering decorator over any `Write` destination. It counts every byte
//! the destination accepts and never decides anything on its own; rotation
//! lives in [`crate::rotation`].

use std::io::{self, Write};

/// Write decorator that counts bytes accepted by the inner destination.
#[derive(Debug)]
pub struct MeteredSink<W: Write> {
    inner: Option<W>,
    bytes_written: u64,
}

impl<W: Write> MeteredSink<W> {
    /// Wrap `inner`, starting the counter at `initial` (the existing length
    /// of the destination when appending).
    pub fn new(inner: W, initial: u64) -> Self {
        MeteredSink {
            inner: Some(inner),
            bytes_written: initial,
        }
    }

    /// Append `text` as UTF-8.
    pub fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.write_all(text.as_bytes())
    }

    /// Total bytes accepted since construction.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Flush and release the destination. Calling it again is a no-op.
    pub fn close(&mut self) -> io::Result<()> {
        match self.inner.take() {
            Some(mut inner) => inner.flush(),
            None => Ok(()),
        }
    }

    fn inner_mut(&mut self) -> io::Result<&mut W> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "sink is closed"))
    }
}

impl<W: Write> Write for MeteredSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner_mut()?.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }
}
