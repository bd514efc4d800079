//! Tokio bridge for the synchronous core.
//!
//! The receiver and sender never await. A tokio host keeps a
//! [`MemoryStream`] on each side and moves bytes between it and the async
//! transport:
//!
//! ```text
//! AsyncRead ──fill_from──► MemoryStream ──poll()──► handlers
//! Instruction::invoke ──► MemoryStream ──write_out──► AsyncWrite
//! ```

use std::io;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{MemoryStream, DEFAULT_CHUNK_SIZE};

/// Read one chunk from `reader` into the inbound side of `stream`.
///
/// Returns the number of bytes added; `0` means the reader reached EOF.
pub async fn fill_from<R>(reader: &mut R, stream: &mut MemoryStream) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; DEFAULT_CHUNK_SIZE];
    let n = reader.read(&mut buf).await?;
    if n == 0 {
        tracing::debug!("Async input closed");
    }
    stream.push(&buf[..n]);
    Ok(n)
}

/// Write `pending` (typically [`MemoryStream::take_written`]) to `writer`
/// and flush.
pub async fn write_out<W>(writer: &mut W, pending: Bytes) -> io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    if pending.is_empty() {
        return Ok(0);
    }
    writer.write_all(&pending).await?;
    writer.flush().await?;
    tracing::trace!("Pumped {} bytes out", pending.len());
    Ok(pending.len())
}
