//! Transport handles and TLS capability probing.
//!
//! # Responsibilities
//! - Abstract over transport objects a server hands to connection info
//! - Expose TLS inspection as an optional capability, not a concrete type
//! - Provide a permissive stream carrying either plaintext or TLS
//!
//! # Design Decisions
//! - Plain sockets keep the default "no capability" answer
//! - Permissive streams always have the capability and answer with the
//!   zero state for plaintext, so probing must treat a zero version as absent

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::net::tls_state::{TlsConnectionState, TlsState};

/// A transport object whose connection metadata may be inspected.
///
/// Implementors only expose read-only queries. Connection info shares the
/// handle and never closes or mutates it.
pub trait Transport: Send + Sync + 'static {
    /// Returns the TLS reporting capability of this transport, if it has one.
    fn tls_state_source(&self) -> Option<&dyn TlsConnectionState> {
        None
    }
}

/// Query a transport for a negotiated TLS session.
///
/// Returns `None` when the transport cannot report TLS state, or when it
/// reports the zero version (plaintext through a permissive wrapper, or a
/// handshake that has not negotiated yet).
pub fn probe_tls_state(transport: &dyn Transport) -> Option<TlsState> {
    let source = transport.tls_state_source()?;
    let state = source.connection_state();
    if state.version.is_unset() {
        tracing::trace!("transport reported zero TLS version, treating as plaintext");
        return None;
    }
    Some(state)
}

impl Transport for tokio::net::TcpStream {}

#[cfg(unix)]
impl Transport for tokio::net::UnixStream {}

impl<IO> Transport for tokio_rustls::server::TlsStream<IO>
where
    IO: Send + Sync + 'static,
{
    fn tls_state_source(&self) -> Option<&dyn TlsConnectionState> {
        Some(self)
    }
}

impl<IO> Transport for tokio_rustls::client::TlsStream<IO>
where
    IO: Send + Sync + 'static,
{
    fn tls_state_source(&self) -> Option<&dyn TlsConnectionState> {
        Some(self)
    }
}

/// A server-side stream that is either plaintext or TLS.
///
/// Produced by listeners that accept both kinds of clients on one port.
#[derive(Debug)]
pub enum MaybeTlsStream<IO> {
    Plain(IO),
    Tls(Box<tokio_rustls::server::TlsStream<IO>>),
}

impl<IO> MaybeTlsStream<IO> {
    pub fn is_tls(&self) -> bool {
        matches!(self, MaybeTlsStream::Tls(_))
    }

    /// The underlying socket.
    pub fn get_ref(&self) -> &IO {
        match self {
            MaybeTlsStream::Plain(io) => io,
            MaybeTlsStream::Tls(tls) => tls.get_ref().0,
        }
    }
}

impl<IO> From<tokio_rustls::server::TlsStream<IO>> for MaybeTlsStream<IO> {
    fn from(stream: tokio_rustls::server::TlsStream<IO>) -> Self {
        MaybeTlsStream::Tls(Box::new(stream))
    }
}

impl<IO> TlsConnectionState for MaybeTlsStream<IO> {
    fn connection_state(&self) -> TlsState {
        match self {
            MaybeTlsStream::Plain(_) => TlsState::default(),
            MaybeTlsStream::Tls(tls) => tls.connection_state(),
        }
    }
}

impl<IO> Transport for MaybeTlsStream<IO>
where
    IO: Send + Sync + 'static,
{
    fn tls_state_source(&self) -> Option<&dyn TlsConnectionState> {
        Some(self)
    }
}

impl<IO> AsyncRead for MaybeTlsStream<IO>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(io) => Pin::new(io).poll_read(cx, buf),
            MaybeTlsStream::Tls(tls) => Pin::new(tls.as_mut()).poll_read(cx, buf),
        }
    }
}

impl<IO> AsyncWrite for MaybeTlsStream<IO>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(io) => Pin::new(io).poll_write(cx, buf),
            MaybeTlsStream::Tls(tls) => Pin::new(tls.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(io) => Pin::new(io).poll_flush(cx),
            MaybeTlsStream::Tls(tls) => Pin::new(tls.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(io) => Pin::new(io).poll_shutdown(cx),
            MaybeTlsStream::Tls(tls) => Pin::new(tls.as_mut()).poll_shutdown(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::tls_state::TlsVersion;

    struct PlainSocket;

    impl Transport for PlainSocket {}

    struct FixedStateSocket(TlsState);

    impl TlsConnectionState for FixedStateSocket {
        fn connection_state(&self) -> TlsState {
            self.0.clone()
        }
    }

    impl Transport for FixedStateSocket {
        fn tls_state_source(&self) -> Option<&dyn TlsConnectionState> {
            Some(self)
        }
    }

    #[test]
    fn transport_without_capability_is_absent() {
        assert_eq!(probe_tls_state(&PlainSocket), None);
    }

    #[test]
    fn zero_version_is_absent() {
        let socket = FixedStateSocket(TlsState::default());
        assert_eq!(probe_tls_state(&socket), None);
    }

    #[test]
    fn negotiated_state_is_returned() {
        let state = TlsState {
            version: TlsVersion::TLS12,
            cipher_suite: Some(rustls::CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256),
            handshake_complete: true,
            alpn_protocol: Some(b"h2".to_vec()),
            ..TlsState::default()
        };
        let socket = FixedStateSocket(state.clone());
        assert_eq!(probe_tls_state(&socket), Some(state));
    }

    #[tokio::test]
    async fn plain_tcp_stream_has_no_capability() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = tokio::net::TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();

        assert!(client.tls_state_source().is_none());
        assert_eq!(probe_tls_state(&server), None);

        let permissive = MaybeTlsStream::Plain(server);
        assert!(!permissive.is_tls());
        assert!(permissive.tls_state_source().is_some());
        assert_eq!(probe_tls_state(&permissive), None);
    }
}
