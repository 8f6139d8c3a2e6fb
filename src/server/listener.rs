use std::io;
use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::mpsc;
use tracing::info;

use crate::config::{Config, ServerConfig};
use crate::http::connection::{Connection, ConnectionSettings};
use crate::http::framer::FrameLimits;
use crate::state::SharedState;
use crate::web::router::Outcome;

const BACKLOG: u32 = 128;

pub async fn run(cfg: &Config, shared: SharedState) -> anyhow::Result<()> {
    let listener = bind(&cfg.server.listen_addr).await?;
    info!("User interface url is http://{}", listener.local_addr()?);
    serve(listener, shared, &cfg.server).await
}

/// Binds a listening socket with address reuse enabled.
pub async fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    let addr = tokio::net::lookup_host(addr)
        .await
        .with_context(|| format!("resolving {addr}"))?
        .next()
        .with_context(|| format!("no address for {addr}"))?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr).with_context(|| format!("binding {addr}"))?;
    Ok(socket.listen(BACKLOG)?)
}

/// Accepts connections until a served page requests shutdown.
pub async fn serve(listener: TcpListener, shared: SharedState, cfg: &ServerConfig) -> anyhow::Result<()> {
    let settings = ConnectionSettings {
        idle_timeout: cfg.idle_timeout(),
        limits: FrameLimits {
            max_header_bytes: cfg.max_header_bytes,
            max_body_bytes: cfg.max_body_bytes,
        },
    };
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                info!("Shutting down");
                return Ok(());
            }

            result = listener.accept() => {
                let Some((socket, peer)) = accepted(result) else {
                    continue;
                };
                info!("Accepted connection from {}", peer);

                let shared = shared.clone();
                let stop_tx = stop_tx.clone();
                tokio::spawn(async move {
                    match Connection::new(socket, shared, settings).run().await {
                        Ok(Outcome::Shutdown) => {
                            let _ = stop_tx.send(()).await;
                        }
                        Ok(Outcome::Continue) => {}
                        Err(e) => tracing::error!("Connection error from {}: {}", peer, e),
                    }
                });
            }
        }
    }
}

/// Unwraps an accept result. A connection reset between readiness and
/// accept, or any other per-connection accept failure, yields nothing.
pub fn accepted<S>(result: io::Result<(S, SocketAddr)>) -> Option<(S, SocketAddr)> {
    match result {
        Ok(conn) => Some(conn),
        Err(e) => {
            tracing::warn!(error = %e, "Accept failed");
            None
        }
    }
}
