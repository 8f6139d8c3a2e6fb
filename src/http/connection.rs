use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::time::timeout;

use crate::http::framer::{Frame, FrameLimits, RequestFramer};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::{ResponseWriter, WriteError};
use crate::state::SharedState;
use crate::web::router::{self, Outcome};

const READ_CHUNK: usize = 4096;

/// Per-connection settings taken from the server configuration.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub idle_timeout: Duration,
    pub limits: FrameLimits,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30),
            limits: FrameLimits::default(),
        }
    }
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Rejecting(Response),
    Closed,
}

/// One accepted connection. It serves a single request and then closes.
pub struct Connection<S> {
    stream: S,
    framer: RequestFramer,
    state: ConnectionState,
    shared: SharedState,
    idle_timeout: Duration,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, shared: SharedState, settings: ConnectionSettings) -> Self {
        Self {
            stream,
            framer: RequestFramer::new(settings.limits),
            state: ConnectionState::Reading,
            shared,
            idle_timeout: settings.idle_timeout,
        }
    }

    /// Drives the connection to completion and reports whether the served
    /// page asked the server to stop.
    pub async fn run(mut self) -> anyhow::Result<Outcome> {
        let mut outcome = Outcome::Continue;

        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = self.read_request().await?;
                }

                ConnectionState::Processing(req) => {
                    let mut writer = ResponseWriter::new(&mut self.stream).with_timeout(self.idle_timeout);
                    let served = match router::dispatch(&req, &self.shared, &mut writer).await {
                        Ok(served) => {
                            tracing::debug!(path = %req.path, bytes = writer.written(), "Response written");
                            writer.finish().await.map(|()| served)
                        }
                        Err(e) => Err(e),
                    };
                    outcome = abandon_on_stall(served, &req.path)?.unwrap_or(Outcome::Continue);
                }

                ConnectionState::Rejecting(response) => {
                    let mut writer = ResponseWriter::new(&mut self.stream).with_timeout(self.idle_timeout);
                    let sent = match writer.send(&response).await {
                        Ok(()) => writer.finish().await,
                        Err(e) => Err(e),
                    };
                    abandon_on_stall(sent, "rejection")?;
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(outcome)
    }

    /// Reads until the framer yields a request, the peer goes away, or the
    /// connection sits idle for too long.
    async fn read_request(&mut self) -> anyhow::Result<ConnectionState> {
        let mut chunk = BytesMut::with_capacity(READ_CHUNK);

        loop {
            chunk.clear();
            let n = match timeout(self.idle_timeout, self.stream.read_buf(&mut chunk)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "Connection reset before request was complete");
                    return Ok(ConnectionState::Closed);
                }
                Err(_) => {
                    tracing::warn!(timeout = ?self.idle_timeout, "Connection idle, closing");
                    return Ok(ConnectionState::Closed);
                }
            };

            if n == 0 {
                // Client closed before the request was complete.
                return Ok(ConnectionState::Closed);
            }

            let framed = match self.framer.feed(&chunk) {
                Ok(Frame::NeedMore) => continue,
                Ok(Frame::Complete(framed)) => framed,
                Err(e) => {
                    tracing::warn!(error = %e, "Rejecting request");
                    return Ok(ConnectionState::Rejecting(Response::bad_request(&e.to_string())));
                }
            };

            return Ok(match Request::from_framed(framed) {
                Ok(req) => ConnectionState::Processing(req),
                Err(e) => {
                    tracing::warn!(error = %e, "Rejecting request body");
                    ConnectionState::Rejecting(Response::bad_request(&e.to_string()))
                }
            });
        }
    }
}

/// A client that stopped reading only ends its own connection; any other
/// failure is passed on.
fn abandon_on_stall<T>(result: anyhow::Result<T>, what: &str) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.downcast_ref::<WriteError>().is_some() => {
            tracing::warn!(response = %what, error = %e, "Abandoning response");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
