//! Response bodies describing the caller's connection.

use serde::{Deserialize, Serialize};

use crate::net::connection::ConnInfo;
use crate::net::tls_state::TlsState;

/// Body of `GET /whoami`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoAmI {
    pub remote: String,
    pub local: String,
    /// `"<remote> -> <local>"`.
    pub display: String,
    pub tls: Option<TlsSummary>,
}

/// Printable view of a negotiated TLS session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsSummary {
    pub version: String,
    pub cipher_suite: Option<String>,
    pub handshake_complete: bool,
    pub server_name: Option<String>,
    pub alpn_protocol: Option<String>,
    pub peer_certificates: usize,
}

impl From<&TlsState> for TlsSummary {
    fn from(state: &TlsState) -> Self {
        Self {
            version: state.version.to_string(),
            cipher_suite: state.cipher_suite.map(|suite| format!("{:?}", suite)),
            handshake_complete: state.handshake_complete,
            server_name: state.server_name.clone(),
            alpn_protocol: state
                .alpn_protocol
                .as_deref()
                .map(|p| String::from_utf8_lossy(p).into_owned()),
            peer_certificates: state.peer_certificates.len(),
        }
    }
}

impl From<&ConnInfo> for WhoAmI {
    fn from(info: &ConnInfo) -> Self {
        Self {
            remote: info.remote_addr.to_string(),
            local: info.local_addr.to_string(),
            display: info.to_string(),
            tls: info.tls().as_deref().map(TlsSummary::from),
        }
    }
}
