//! Per-connection metadata for request handlers.
//!
//! A server builds a [`ConnInfo`] for each accepted connection or request,
//! binds it into the request [`Context`], and handlers read it back to learn
//! who they are talking to and whether the channel is encrypted.

pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServerConfig;
pub use context::{conn_info_from_context, with_conn_info, Context, ContextKey};
pub use error::Error;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use net::{ConnInfo, NetAddr, TlsConnectionState, TlsState, TlsVersion, Transport};
