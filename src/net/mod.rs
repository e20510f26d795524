//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming connection
//!     → listener.rs (accept loop, optional/permissive TLS handshake)
//!     → transport.rs (transport handle, TLS capability probe)
//!     → connection.rs (ConnInfo: addresses + TLS source)
//!     → Hand off to the request context
//! ```
//!
//! # Design Decisions
//! - TLS inspection is a capability of a transport, not a concrete type
//! - A zero TLS version is reported as "no TLS"
//! - Connection info never owns or closes the transport

pub mod addr;
pub mod connection;
pub mod listener;
pub mod tls;
pub mod tls_state;
pub mod transport;

pub use addr::NetAddr;
pub use connection::ConnInfo;
pub use tls_state::{TlsConnectionState, TlsState, TlsVersion};
pub use transport::{probe_tls_state, MaybeTlsStream, Transport};
