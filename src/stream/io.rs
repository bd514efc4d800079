//! `std::io` transport adapter.
//!
//! Wraps anything that is `Read + Write` (a serial port handle, a
//! non-blocking `TcpStream`, a pipe) and gives it the byte-stream contract.
//!
//! `available()` drains whatever the transport can deliver *right now* into
//! an internal buffer. The transport must therefore not block indefinitely
//! on `read`: put sockets in non-blocking mode, give serial ports a read
//! timeout. `WouldBlock` and `TimedOut` both mean "no bytes yet"; `Ok(0)`
//! marks the stream closed. Any other read error also closes the stream and
//! is kept until [`IoStream::take_error`] or the next failing `read_exact`
//! hands it out. Bytes buffered before the error can still be read.
//!
//! # Example
//!
//! ```ignore
//! use std::net::TcpStream;
//! use serialwire::stream::IoStream;
//!
//! let socket = TcpStream::connect("127.0.0.1:7000")?;
//! socket.set_nonblocking(true)?;
//! let stream = IoStream::new(socket);
//! ```

use std::io::{self, Read, Write};

use bytes::{Buf, BytesMut};

use super::{InputStream, OutputStream};

/// Default number of bytes requested from the transport per read call.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Byte stream over a `std::io` transport.
#[derive(Debug)]
pub struct IoStream<T> {
    /// The wrapped transport.
    inner: T,
    /// Bytes received from the transport and not yet consumed.
    buffer: BytesMut,
    /// Bytes requested per transport read.
    chunk_size: usize,
    /// Transport reported end of stream or failed.
    closed: bool,
    /// Hard read error that closed the stream, not yet reported.
    error: Option<io::Error>,
}

impl<T> IoStream<T> {
    /// Wrap a transport.
    pub fn new(inner: T) -> Self {
        Self::with_chunk_size(inner, DEFAULT_CHUNK_SIZE)
    }

    /// Wrap a transport with a custom read chunk size.
    pub fn with_chunk_size(inner: T, chunk_size: usize) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(chunk_size),
            chunk_size: chunk_size.max(1),
            closed: false,
            error: None,
        }
    }

    /// Whether the transport has reported end of stream or failed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Take the read error that closed the stream, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Bytes already pulled from the transport but not consumed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Shared reference to the transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutable reference to the transport.
    ///
    /// Reading from it directly bypasses the internal buffer.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Unwrap the transport, discarding buffered bytes.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> IoStream<T> {
    /// Move everything the transport can deliver without blocking into the
    /// buffer. Returns the number of bytes pulled.
    pub fn fill(&mut self) -> io::Result<usize> {
        let mut total = 0;

        while !self.closed {
            let start = self.buffer.len();
            self.buffer.resize(start + self.chunk_size, 0);

            let result = self.inner.read(&mut self.buffer[start..]);
            let n = match result {
                Ok(n) => n,
                Err(e) => {
                    self.buffer.truncate(start);
                    match e.kind() {
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => break,
                        io::ErrorKind::Interrupted => continue,
                        _ => {
                            tracing::warn!("Transport read failed, closing stream: {}", e);
                            self.closed = true;
                            return Err(e);
                        }
                    }
                }
            };
            self.buffer.truncate(start + n);

            if n == 0 {
                tracing::debug!("Transport reached end of stream");
                self.closed = true;
                break;
            }
            total += n;

            if n < self.chunk_size {
                break;
            }
        }

        Ok(total)
    }
}

impl<T: Read> InputStream for IoStream<T> {
    fn available(&mut self) -> usize {
        if let Err(e) = self.fill() {
            self.error = Some(e);
        }
        self.buffer.len()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        if self.buffer.len() < buf.len() {
            self.fill()?;
        }
        if self.buffer.len() < buf.len() {
            if let Some(e) = self.error.take() {
                return Err(e);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "need {} bytes, {} buffered",
                    buf.len(),
                    self.buffer.len()
                ),
            ));
        }
        self.buffer.copy_to_slice(buf);
        Ok(())
    }
}

impl<T: Write> OutputStream for IoStream<T> {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
