//! Connection info captured when the HTTP server accepts a connection.
//!
//! The HTTP server owns its streams, so handlers never see the transport.
//! TLS state is therefore probed once here and captured into the `ConnInfo`.

use axum::extract::connect_info::Connected;
use axum::serve::IncomingStream;
use tokio::net::TcpListener;

use crate::net::addr::NetAddr;
use crate::net::connection::ConnInfo;
use crate::net::listener::TlsListener;
use crate::net::transport::probe_tls_state;

impl Connected<IncomingStream<'_, TcpListener>> for ConnInfo {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        let local = stream
            .io()
            .local_addr()
            .map(NetAddr::from)
            .unwrap_or_default();
        ConnInfo::with_tls_state(local, *stream.remote_addr(), None)
    }
}

impl Connected<IncomingStream<'_, TlsListener>> for ConnInfo {
    fn connect_info(stream: IncomingStream<'_, TlsListener>) -> Self {
        let io = stream.io();
        let local = io
            .get_ref()
            .local_addr()
            .map(NetAddr::from)
            .unwrap_or_default();
        ConnInfo::with_tls_state(local, *stream.remote_addr(), probe_tls_state(io))
    }
}

#[cfg(unix)]
impl Connected<IncomingStream<'_, tokio::net::UnixListener>> for ConnInfo {
    fn connect_info(stream: IncomingStream<'_, tokio::net::UnixListener>) -> Self {
        let local = stream
            .io()
            .local_addr()
            .map(NetAddr::from)
            .unwrap_or_default();
        ConnInfo::with_tls_state(local, NetAddr::from(stream.remote_addr().clone()), None)
    }
}
