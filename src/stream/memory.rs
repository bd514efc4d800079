//! In-memory byte stream.
//!
//! Uses `bytes::BytesMut` for both directions. Inbound bytes are fed with
//! [`MemoryStream::push`] and consumed by a receiver; outbound bytes written by
//! a sender accumulate until taken with [`MemoryStream::take_written`].
//!
//! # Example
//!
//! ```
//! use serialwire::stream::{InputStream, MemoryStream, OutputStream};
//!
//! let mut stream = MemoryStream::new();
//! stream.push(&[1, 2, 3]);
//! assert_eq!(stream.available(), 3);
//!
//! stream.write_all(&[9]).unwrap();
//! assert_eq!(&stream.take_written()[..], &[9]);
//! ```

use std::io;

use bytes::{Buf, Bytes, BytesMut};

use super::{InputStream, OutputStream};

/// Default capacity of each direction's buffer.
const DEFAULT_CAPACITY: usize = 256;

/// Duplex stream backed by two in-memory buffers.
#[derive(Debug, Clone)]
pub struct MemoryStream {
    /// Bytes waiting to be read.
    inbound: BytesMut,
    /// Bytes written and not yet taken.
    outbound: BytesMut,
    /// Maximum number of untaken outbound bytes, if bounded.
    write_limit: Option<usize>,
}

impl MemoryStream {
    /// Create an empty, unbounded stream.
    pub fn new() -> Self {
        Self {
            inbound: BytesMut::with_capacity(DEFAULT_CAPACITY),
            outbound: BytesMut::with_capacity(DEFAULT_CAPACITY),
            write_limit: None,
        }
    }

    /// Create a stream with `data` already buffered for reading.
    pub fn from_inbound(data: &[u8]) -> Self {
        let mut stream = Self::new();
        stream.push(data);
        stream
    }

    /// Create a stream that refuses writes once `limit` untaken bytes are
    /// buffered, like a full transmit FIFO.
    pub fn with_write_limit(limit: usize) -> Self {
        Self {
            write_limit: Some(limit),
            ..Self::new()
        }
    }

    /// Append bytes to the inbound side.
    pub fn push(&mut self, data: &[u8]) {
        self.inbound.extend_from_slice(data);
    }

    /// Bytes written so far and not yet taken.
    pub fn written(&self) -> &[u8] {
        &self.outbound
    }

    /// Take all written bytes, leaving the outbound side empty.
    pub fn take_written(&mut self) -> Bytes {
        self.outbound.split().freeze()
    }

    /// Number of inbound bytes not yet read.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Drop everything buffered in both directions.
    pub fn clear(&mut self) {
        self.inbound.clear();
        self.outbound.clear();
    }
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new()
    }
}

impl InputStream for MemoryStream {
    #[inline]
    fn available(&mut self) -> usize {
        self.inbound.len()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        if self.inbound.len() < buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "need {} bytes, {} buffered",
                    buf.len(),
                    self.inbound.len()
                ),
            ));
        }
        self.inbound.copy_to_slice(buf);
        Ok(())
    }
}

impl OutputStream for MemoryStream {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        if let Some(limit) = self.write_limit {
            if self.outbound.len() + buf.len() > limit {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!(
                        "write of {} bytes exceeds limit {} ({} buffered)",
                        buf.len(),
                        limit,
                        self.outbound.len()
                    ),
                ));
            }
        }
        self.outbound.extend_from_slice(buf);
        Ok(())
    }
}
