//! Per-connection metadata handed from the server to request handlers.
//!
//! # Responsibilities
//! - Carry local and remote addresses of a connection
//! - Carry either a shared transport handle or a captured TLS snapshot
//! - Resolve the TLS session visible to the handler
//!
//! # Design Decisions
//! - Immutable once built; cheap to clone (handles are `Arc`s)
//! - Captured state wins over probing the transport
//! - Absence of TLS is a normal outcome, never an error

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::net::addr::NetAddr;
use crate::net::tls_state::TlsState;
use crate::net::transport::{probe_tls_state, Transport};

/// Connection information for a client of the server.
///
/// Built once by the dispatch layer, either from a raw stream (the transport
/// handle is kept) or from a server that terminated TLS itself (the TLS state
/// is captured up front). A value with neither source is valid and reports
/// no TLS state.
#[derive(Clone, Default)]
pub struct ConnInfo {
    pub local_addr: NetAddr,
    pub remote_addr: NetAddr,

    transport: Option<Arc<dyn Transport>>,
    tls_state: Option<Arc<TlsState>>,
}

impl ConnInfo {
    /// Connection info with no TLS source.
    pub fn new(local_addr: impl Into<NetAddr>, remote_addr: impl Into<NetAddr>) -> Self {
        Self {
            local_addr: local_addr.into(),
            remote_addr: remote_addr.into(),
            transport: None,
            tls_state: None,
        }
    }

    /// Connection info for stream servers, keeping a shared transport handle.
    pub fn from_transport(
        local_addr: impl Into<NetAddr>,
        remote_addr: impl Into<NetAddr>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            transport: Some(transport),
            ..Self::new(local_addr, remote_addr)
        }
    }

    /// Connection info for servers that resolved TLS before building it.
    ///
    /// `None` records a plaintext connection, and so does a state carrying
    /// the zero protocol version.
    pub fn with_tls_state(
        local_addr: impl Into<NetAddr>,
        remote_addr: impl Into<NetAddr>,
        tls_state: Option<TlsState>,
    ) -> Self {
        Self {
            tls_state: tls_state
                .filter(|state| !state.version.is_unset())
                .map(Arc::new),
            ..Self::new(local_addr, remote_addr)
        }
    }

    /// Returns the TLS session state of the connection.
    ///
    /// A captured state is returned as-is. Otherwise the transport handle is
    /// probed for TLS reporting support; transports without it, and
    /// transports reporting the zero protocol version, yield `None`.
    pub fn tls(&self) -> Option<Cow<'_, TlsState>> {
        if let Some(state) = &self.tls_state {
            return Some(Cow::Borrowed(state.as_ref()));
        }
        let transport = self.transport.as_deref()?;
        probe_tls_state(transport).map(Cow::Owned)
    }

    /// Whether the connection is known to be encrypted.
    pub fn is_tls(&self) -> bool {
        self.tls().is_some()
    }

    /// The shared transport handle, for stream-server connections.
    pub fn transport(&self) -> Option<&Arc<dyn Transport>> {
        self.transport.as_ref()
    }
}

impl fmt::Display for ConnInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.remote_addr, self.local_addr)
    }
}

impl fmt::Debug for ConnInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnInfo")
            .field("local_addr", &self.local_addr)
            .field("remote_addr", &self.remote_addr)
            .field("has_transport", &self.transport.is_some())
            .field("tls_state", &self.tls_state)
            .finish()
    }
}

impl PartialEq for ConnInfo {
    fn eq(&self, other: &Self) -> bool {
        let same_transport = match (&self.transport, &other.transport) {
            (Some(a), Some(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (None, None) => true,
            _ => false,
        };
        self.local_addr == other.local_addr
            && self.remote_addr == other.remote_addr
            && self.tls_state == other.tls_state
            && same_transport
    }
}
