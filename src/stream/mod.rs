//! Stream module - the byte-stream contract and its adapters.
//!
//! The core only needs two small synchronous traits:
//! - [`InputStream`] - "how many bytes can I read now" and "read exactly N"
//! - [`OutputStream`] - "write all of these" and "flush"
//!
//! On top of them sit the typed cursors ([`Reader`], [`Writer`]) and the
//! reference adapters:
//! - [`MemoryStream`] - in-memory buffers (tests, loopback, async bridges)
//! - [`IoStream`] - any `std::io::Read + Write` transport (serial port, socket)
//! - `pump` - tokio bridge, behind the `tokio` feature

mod cursor;
mod io;
mod memory;
#[cfg(feature = "tokio")]
pub mod pump;

pub use cursor::{Reader, Writer};
pub use io::{IoStream, DEFAULT_CHUNK_SIZE};
pub use memory::MemoryStream;

/// Readable half of a byte stream.
pub trait InputStream {
    /// Number of bytes that can be read right now without blocking.
    fn available(&mut self) -> usize;

    /// Fill `buf` completely.
    ///
    /// On error nothing observable may have been consumed.
    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()>;
}

/// Writable half of a byte stream.
pub trait OutputStream {
    /// Write every byte of `buf` or fail.
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Push buffered bytes to the transport.
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<S: InputStream + ?Sized> InputStream for &mut S {
    fn available(&mut self) -> usize {
        (**self).available()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        (**self).read_exact(buf)
    }
}

impl<S: OutputStream + ?Sized> OutputStream for &mut S {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        (**self).write_all(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        (**self).flush()
    }
}
