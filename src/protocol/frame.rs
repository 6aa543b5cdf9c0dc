//! Length-prefixed frames.
//!
//! Every request and response travels as an `INT32` byte length followed by that many bytes.
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_common>

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::traits::WriteType;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReadError {
    #[error("Cannot read data: {0}")]
    IO(#[from] std::io::Error),

    #[error("Negative message size: {size}")]
    NegativeMessageSize { size: i32 },

    #[error("Message too large, limit is {limit} bytes but got {actual} bytes")]
    MessageTooLarge { limit: usize, actual: usize },
}

#[async_trait]
pub trait AsyncMessageRead {
    /// Reads one frame and returns its payload, without the length prefix.
    async fn read_message(&mut self, max_message_size: usize) -> Result<Vec<u8>, ReadError>;
}

#[async_trait]
impl<R> AsyncMessageRead for R
where
    R: AsyncRead + Send + Unpin,
{
    async fn read_message(&mut self, max_message_size: usize) -> Result<Vec<u8>, ReadError> {
        let mut len_buf = [0u8; 4];
        self.read_exact(&mut len_buf).await?;
        let len = i32::from_be_bytes(len_buf);
        let len = usize::try_from(len).map_err(|_| ReadError::NegativeMessageSize { size: len })?;

        if len > max_message_size {
            return Err(ReadError::MessageTooLarge {
                limit: max_message_size,
                actual: len,
            });
        }

        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf).await?;
        Ok(buf)
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WriteError {
    #[error("Cannot write data: {0}")]
    IO(#[from] std::io::Error),
}

#[async_trait]
pub trait AsyncMessageWrite {
    /// Writes an already framed buffer and flushes.
    async fn write_message(&mut self, msg: &[u8]) -> Result<(), WriteError>;
}

#[async_trait]
impl<W> AsyncMessageWrite for W
where
    W: AsyncWrite + Send + Unpin,
{
    async fn write_message(&mut self, msg: &[u8]) -> Result<(), WriteError> {
        self.write_all(msg).await?;
        self.flush().await?;
        Ok(())
    }
}

/// Builds a complete frame: length prefix, then `header`, then `body`.
///
/// The length is computed up front from [`EncodedSize`](super::traits::EncodedSize), so the
/// buffer is allocated once and the prefix never needs patching.
pub fn encode_frame<H, B>(header: &H, body: &B) -> Result<Vec<u8>, super::traits::WriteError>
where
    H: WriteType<Vec<u8>>,
    B: WriteType<Vec<u8>>,
{
    let size = header.encoded_size() + body.encoded_size();
    let prefix = i32::try_from(size)?;

    let mut buf = Vec::with_capacity(4 + size);
    prefix.write(&mut buf)?;
    header.write(&mut buf)?;
    body.write(&mut buf)?;

    debug_assert_eq!(buf.len(), 4 + size, "encoded_size disagrees with write");
    Ok(buf)
}
