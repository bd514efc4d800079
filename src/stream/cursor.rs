//! Typed cursors over byte streams.
//!
//! [`Reader`] and [`Writer`] move one [`Wire`] value at a time. A value is
//! either transferred whole or not at all: the reader checks that every byte
//! is buffered before consuming any, and the writer hands the full encoding to
//! the stream in a single `write_all`.

use std::time::{Duration, Instant};

use bytes::BytesMut;

use super::{InputStream, OutputStream};
use crate::codec::Wire;
use crate::config::{ArgumentRead, CHECK_INTERVAL};
use crate::error::{Result, SerialwireError};

/// Read side of the typed cursor, handed to receive handlers.
pub struct Reader<'a, S: ?Sized> {
    stream: &'a mut S,
    scratch: &'a mut BytesMut,
    policy: ArgumentRead,
}

impl<'a, S: InputStream + ?Sized> Reader<'a, S> {
    /// Create a fail-fast reader over `stream`, decoding through `scratch`.
    pub fn new(stream: &'a mut S, scratch: &'a mut BytesMut) -> Self {
        Self::with_policy(stream, scratch, ArgumentRead::FailFast)
    }

    /// Create a reader with an explicit argument-read policy.
    pub fn with_policy(stream: &'a mut S, scratch: &'a mut BytesMut, policy: ArgumentRead) -> Self {
        Self {
            stream,
            scratch,
            policy,
        }
    }

    /// Number of bytes readable right now. Does not consume anything.
    #[inline]
    pub fn available(&mut self) -> usize {
        self.stream.available()
    }

    /// Read one value.
    ///
    /// Under [`ArgumentRead::Wait`] this waits up to the configured timeout
    /// for the bytes to arrive. Fails with
    /// [`SerialwireError::InstructionArgumentReadFail`] if they never do,
    /// leaving the stream untouched.
    pub fn read<T: Wire>(&mut self) -> Result<T> {
        if let ArgumentRead::Wait { timeout_ms } = self.policy {
            self.wait_for(T::WIDTH, Duration::from_millis(timeout_ms));
        }
        self.take()
    }

    /// Direct access to the underlying stream.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut *self.stream
    }

    /// Read one value without waiting.
    pub(crate) fn take<T: Wire>(&mut self) -> Result<T> {
        let needed = T::WIDTH;
        let available = self.stream.available();
        if available < needed {
            tracing::debug!("Short read: need {} bytes, {} available", needed, available);
            return Err(SerialwireError::InstructionArgumentReadFail { needed, available });
        }

        self.scratch.clear();
        self.scratch.resize(needed, 0);
        if let Err(e) = self.stream.read_exact(&mut self.scratch[..]) {
            tracing::debug!("Stream read of {} bytes failed: {}", needed, e);
            return Err(SerialwireError::InstructionArgumentReadFail { needed, available });
        }

        let mut bytes = &self.scratch[..];
        Ok(T::decode(&mut bytes))
    }

    fn wait_for(&mut self, needed: usize, timeout: Duration) {
        let start = Instant::now();

        while self.stream.available() < needed {
            if start.elapsed() > timeout {
                return;
            }
            std::thread::sleep(CHECK_INTERVAL);
        }
    }
}

/// Write side of the typed cursor, handed to send handlers.
pub struct Writer<'a, S: ?Sized> {
    stream: &'a mut S,
    scratch: &'a mut BytesMut,
}

impl<'a, S: OutputStream + ?Sized> Writer<'a, S> {
    /// Create a writer over `stream`, encoding through `scratch`.
    pub fn new(stream: &'a mut S, scratch: &'a mut BytesMut) -> Self {
        Self { stream, scratch }
    }

    /// Write one value.
    ///
    /// Fails with [`SerialwireError::InstructionArgumentWriteFail`] if the
    /// stream does not accept the whole encoding.
    pub fn write<T: Wire>(&mut self, value: &T) -> Result<()> {
        self.scratch.clear();
        value.encode(&mut *self.scratch);

        let len = self.scratch.len();
        self.stream.write_all(&self.scratch[..]).map_err(|e| {
            tracing::debug!("Stream write of {} bytes failed: {}", len, e);
            SerialwireError::InstructionArgumentWriteFail { len }
        })
    }

    /// Direct access to the underlying stream.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut *self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryStream;

    #[test]
    fn test_read_value() {
        let mut stream = MemoryStream::from_inbound(&[0x2A, 0x00, 0x00, 0x00, 0x07]);
        let mut scratch = BytesMut::new();
        let mut reader = Reader::new(&mut stream, &mut scratch);

        assert_eq!(reader.available(), 5);
        assert_eq!(reader.read::<u32>().unwrap(), 42);
        assert_eq!(reader.read::<u8>().unwrap(), 7);
        assert_eq!(reader.available(), 0);
    }

    #[test]
    fn test_short_read_consumes_nothing() {
        let mut stream = MemoryStream::from_inbound(&[0x01, 0x02]);
        let mut scratch = BytesMut::new();
        let mut reader = Reader::new(&mut stream, &mut scratch);

        let err = reader.read::<u32>().unwrap_err();
        assert!(matches!(
            err,
            SerialwireError::InstructionArgumentReadFail {
                needed: 4,
                available: 2
            }
        ));
        assert_eq!(reader.available(), 2);
        assert_eq!(reader.read::<u16>().unwrap(), 0x0201);
    }

    #[test]
    fn test_zero_width_read_always_succeeds() {
        let mut stream = MemoryStream::new();
        let mut scratch = BytesMut::new();
        let mut reader = Reader::new(&mut stream, &mut scratch);

        reader.read::<()>().unwrap();
    }

    #[test]
    fn test_wait_policy_times_out() {
        let mut stream = MemoryStream::from_inbound(&[0x01]);
        let mut scratch = BytesMut::new();
        let mut reader = Reader::with_policy(
            &mut stream,
            &mut scratch,
            ArgumentRead::Wait { timeout_ms: 5 },
        );

        let start = Instant::now();
        let result = reader.read::<u16>();
        assert!(result.is_err());
        assert!(start.elapsed() >= Duration::from_millis(5));
        assert_eq!(reader.available(), 1);
    }

    #[test]
    fn test_wait_policy_returns_immediately_when_buffered() {
        let mut stream = MemoryStream::from_inbound(&[0x01, 0x00]);
        let mut scratch = BytesMut::new();
        let mut reader = Reader::with_policy(
            &mut stream,
            &mut scratch,
            ArgumentRead::Wait { timeout_ms: 10_000 },
        );

        assert_eq!(reader.read::<u16>().unwrap(), 1);
    }

    #[test]
    fn test_write_value() {
        let mut stream = MemoryStream::new();
        let mut scratch = BytesMut::new();
        let mut writer = Writer::new(&mut stream, &mut scratch);

        writer.write(&42u32).unwrap();
        writer.write(&(true, -1i8)).unwrap();

        assert_eq!(stream.written(), &[0x2A, 0x00, 0x00, 0x00, 0x01, 0xFF]);
    }

    #[test]
    fn test_write_rejected_is_all_or_nothing() {
        let mut stream = MemoryStream::with_write_limit(3);
        let mut scratch = BytesMut::new();
        let mut writer = Writer::new(&mut stream, &mut scratch);

        let err = writer.write(&0u32).unwrap_err();
        assert!(matches!(
            err,
            SerialwireError::InstructionArgumentWriteFail { len: 4 }
        ));
        writer.write(&[1u8, 2, 3]).unwrap();

        assert_eq!(stream.written(), &[1, 2, 3]);
    }
}
