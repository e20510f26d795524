//! TLS-terminating listener for the HTTP server.
//!
//! # Responsibilities
//! - Accept incoming TCP connections
//! - Run the TLS handshake (always, or only for clients that speak TLS)
//! - Bound each handshake by a timeout
//! - Graceful handling of accept and handshake errors
//!
//! # Design Decisions
//! - Handshakes run on their own tasks; `accept` hands out whichever finishes
//!   first, so a silent client never holds up the others

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::serve::Listener;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;

use crate::config::TlsMode;
use crate::net::transport::MaybeTlsStream;

/// First byte of a TLS record carrying a handshake message.
const TLS_HANDSHAKE_RECORD: u8 = 0x16;

type Established = (io::Result<MaybeTlsStream<TcpStream>>, SocketAddr);

/// A TCP listener that terminates TLS before handing streams to the server.
///
/// In [`TlsMode::Permissive`] the first byte of each connection decides
/// whether a handshake is attempted; anything else is served as plaintext.
pub struct TlsListener {
    inner: TcpListener,
    handshaker: Handshaker,
    pending: JoinSet<Established>,
}

#[derive(Clone)]
struct Handshaker {
    acceptor: TlsAcceptor,
    mode: TlsMode,
    timeout: Duration,
}

impl TlsListener {
    pub fn new(
        inner: TcpListener,
        acceptor: TlsAcceptor,
        mode: TlsMode,
        handshake_timeout: Duration,
    ) -> Self {
        Self {
            inner,
            handshaker: Handshaker {
                acceptor,
                mode,
                timeout: handshake_timeout,
            },
            pending: JoinSet::new(),
        }
    }

    pub fn mode(&self) -> TlsMode {
        self.handshaker.mode
    }

    /// Handshakes accepted but not yet handed to the server.
    pub fn pending_handshakes(&self) -> usize {
        self.pending.len()
    }
}

impl Handshaker {
    async fn establish(&self, stream: TcpStream) -> io::Result<MaybeTlsStream<TcpStream>> {
        tokio::time::timeout(self.timeout, self.handshake(stream))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "TLS handshake timed out"))?
    }

    async fn handshake(&self, stream: TcpStream) -> io::Result<MaybeTlsStream<TcpStream>> {
        let speaks_tls = match self.mode {
            TlsMode::Required => true,
            TlsMode::Permissive => starts_with_handshake(&stream).await?,
        };
        if !speaks_tls {
            return Ok(MaybeTlsStream::Plain(stream));
        }
        let tls = self.acceptor.accept(stream).await?;
        Ok(MaybeTlsStream::from(tls))
    }
}

impl Listener for TlsListener {
    type Io = MaybeTlsStream<TcpStream>;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            tokio::select! {
                accepted = self.inner.accept() => match accepted {
                    Ok((stream, peer_addr)) => {
                        let handshaker = self.handshaker.clone();
                        self.pending.spawn(async move {
                            (handshaker.establish(stream).await, peer_addr)
                        });
                    }
                    Err(e) => handle_accept_error(e).await,
                },
                Some(joined) = self.pending.join_next(), if !self.pending.is_empty() => {
                    match joined {
                        Ok((Ok(io), peer_addr)) => {
                            tracing::debug!(
                                peer_addr = %peer_addr,
                                tls = io.is_tls(),
                                "Connection accepted"
                            );
                            return (io, peer_addr);
                        }
                        Ok((Err(e), peer_addr)) => {
                            tracing::warn!(peer_addr = %peer_addr, error = %e, "TLS handshake failed");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Handshake task failed");
                        }
                    }
                }
            }
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        self.inner.local_addr()
    }
}

async fn starts_with_handshake(stream: &TcpStream) -> io::Result<bool> {
    let mut first = [0u8; 1];
    let n = stream.peek(&mut first).await?;
    Ok(n == 1 && first[0] == TLS_HANDSHAKE_RECORD)
}

async fn handle_accept_error(e: io::Error) {
    if matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    ) {
        return;
    }

    tracing::error!(error = %e, "Failed to accept connection");
    tokio::time::sleep(Duration::from_secs(1)).await;
}
