use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::http::response::{Response, ResponseHead};

const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// The peer stopped taking bytes; the connection is abandoned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WriteError {
    #[error("client stopped reading for {0:?}")]
    Stalled(Duration),
    #[error("connection closed while writing")]
    Closed,
}

/// Outbound half of a connection.
///
/// Page handlers push HTML fragments through the writer as they produce
/// them, so a page never has to be assembled in memory before its first
/// byte is sent. Every write is bounded by the write timeout: a client that
/// stops reading fails the response instead of holding its handler (and the
/// shared state it has locked) indefinitely.
pub struct ResponseWriter<'a, W> {
    stream: &'a mut W,
    written: usize,
    write_timeout: Duration,
}

impl<'a, W: AsyncWrite + Unpin> ResponseWriter<'a, W> {
    pub fn new(stream: &'a mut W) -> Self {
        Self {
            stream,
            written: 0,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// Total number of bytes written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub async fn push(&mut self, bytes: impl AsRef<[u8]>) -> anyhow::Result<()> {
        let bytes = bytes.as_ref();
        let mut offset = 0;

        while offset < bytes.len() {
            let n = timeout(self.write_timeout, self.stream.write(&bytes[offset..]))
                .await
                .map_err(|_| WriteError::Stalled(self.write_timeout))??;

            if n == 0 {
                return Err(WriteError::Closed.into());
            }

            offset += n;
        }

        self.written += bytes.len();
        Ok(())
    }

    pub async fn push_head(&mut self, head: &ResponseHead) -> anyhow::Result<()> {
        self.push(head.to_bytes()).await
    }

    pub async fn send(&mut self, response: &Response) -> anyhow::Result<()> {
        self.push(response.to_bytes()).await
    }

    /// Flushes everything written and closes the write side.
    pub async fn finish(self) -> anyhow::Result<()> {
        let limit = self.write_timeout;
        timeout(limit, async {
            self.stream.flush().await?;
            self.stream.shutdown().await
        })
        .await
        .map_err(|_| WriteError::Stalled(limit))??;
        Ok(())
    }
}
