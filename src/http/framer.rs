//! Per-connection request framing.
//!
//! A [`RequestFramer`] turns an arbitrary sequence of byte chunks into exactly
//! one request. It first reads until the blank line that ends the head, then,
//! for a POST with a positive `Content-Length`, switches to reading exactly
//! that many body bytes.

use bytes::{Bytes, BytesMut};
use memchr::memmem;
use thiserror::Error;

use crate::http::parser::{parse_head, ParseError, RequestHead};

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Request head exceeds {0} bytes")]
    HeadTooLarge(usize),
    #[error("Request body of {0} bytes is too large")]
    BodyTooLarge(usize),
    #[error("Framer already produced its request")]
    Exhausted,
}

/// How many more bytes must arrive before the current unit is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    Delimiter(&'static [u8]),
    Count(usize),
}

#[derive(Debug)]
pub enum FramerState {
    AwaitingHeaders,
    AwaitingBody { head: RequestHead, length: usize },
    Complete,
}

/// A request whose head has been parsed and whose body is fully read.
#[derive(Debug, Clone)]
pub struct FramedRequest {
    pub head: RequestHead,
    pub body: Bytes,
}

#[derive(Debug)]
pub enum Frame {
    /// More input is required.
    NeedMore,
    Complete(FramedRequest),
}

#[derive(Debug, Clone, Copy)]
pub struct FrameLimits {
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            max_header_bytes: 64 * 1024,
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

pub struct RequestFramer {
    buffer: BytesMut,
    state: FramerState,
    limits: FrameLimits,
}

impl RequestFramer {
    pub fn new(limits: FrameLimits) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            state: FramerState::AwaitingHeaders,
            limits,
        }
    }

    pub fn state(&self) -> &FramerState {
        &self.state
    }

    /// Current terminator mode, or `None` once the request is complete.
    pub fn terminator(&self) -> Option<Terminator> {
        match &self.state {
            FramerState::AwaitingHeaders => Some(Terminator::Delimiter(HEAD_TERMINATOR)),
            FramerState::AwaitingBody { length, .. } => {
                Some(Terminator::Count(length.saturating_sub(self.buffer.len())))
            }
            FramerState::Complete => None,
        }
    }

    /// Consumes a chunk of input and reports whether the request is complete.
    ///
    /// Bytes following a complete request are discarded; a framer serves a
    /// single request.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Frame, FrameError> {
        if matches!(self.state, FramerState::Complete) {
            return Err(FrameError::Exhausted);
        }
        self.buffer.extend_from_slice(bytes);

        loop {
            match std::mem::replace(&mut self.state, FramerState::Complete) {
                FramerState::AwaitingHeaders => {
                    let Some(end) = memmem::find(&self.buffer, HEAD_TERMINATOR) else {
                        if self.buffer.len() > self.limits.max_header_bytes {
                            return Err(FrameError::HeadTooLarge(self.limits.max_header_bytes));
                        }
                        self.state = FramerState::AwaitingHeaders;
                        return Ok(Frame::NeedMore);
                    };

                    let raw = self.buffer.split_to(end + HEAD_TERMINATOR.len());
                    let head = parse_head(&raw[..end])?;
                    let length = head.body_length()?;

                    if length == 0 {
                        tracing::debug!(uri = %head.target, "request has no body");
                        self.buffer.clear();
                        return Ok(Frame::Complete(FramedRequest {
                            head,
                            body: Bytes::new(),
                        }));
                    }
                    if length > self.limits.max_body_bytes {
                        return Err(FrameError::BodyTooLarge(length));
                    }

                    tracing::debug!(uri = %head.target, length, "awaiting request body");
                    self.state = FramerState::AwaitingBody { head, length };
                }

                FramerState::AwaitingBody { head, length } => {
                    if self.buffer.len() < length {
                        self.state = FramerState::AwaitingBody { head, length };
                        return Ok(Frame::NeedMore);
                    }

                    let body = self.buffer.split_to(length).freeze();
                    self.buffer.clear();
                    return Ok(Frame::Complete(FramedRequest { head, body }));
                }

                FramerState::Complete => return Err(FrameError::Exhausted),
            }
        }
    }
}

impl Default for RequestFramer {
    fn default() -> Self {
        Self::new(FrameLimits::default())
    }
}
