//! TLS session state snapshots and the capability to report them.
//!
//! # Responsibilities
//! - Describe a negotiated TLS session (version, suite, ALPN, peer certs)
//! - Define the `TlsConnectionState` capability implemented by TLS transports
//! - Read state out of rustls sessions without touching the handshake
//!
//! # Design Decisions
//! - A zero protocol version means "not TLS / not negotiated yet"
//! - Reads are from cached session parameters only, never blocking

use std::fmt;

use rustls::pki_types::CertificateDer;
use rustls::{CipherSuite, CommonState};

/// Wire protocol version of a TLS session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TlsVersion(u16);

impl TlsVersion {
    /// Sentinel for "no version negotiated".
    pub const UNSET: TlsVersion = TlsVersion(0);
    pub const SSL3: TlsVersion = TlsVersion(0x0300);
    pub const TLS10: TlsVersion = TlsVersion(0x0301);
    pub const TLS11: TlsVersion = TlsVersion(0x0302);
    pub const TLS12: TlsVersion = TlsVersion(0x0303);
    pub const TLS13: TlsVersion = TlsVersion(0x0304);

    pub const fn from_u16(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    pub const fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TlsVersion::SSL3 => f.write_str("SSLv3"),
            TlsVersion::TLS10 => f.write_str("TLSv1.0"),
            TlsVersion::TLS11 => f.write_str("TLSv1.1"),
            TlsVersion::TLS12 => f.write_str("TLSv1.2"),
            TlsVersion::TLS13 => f.write_str("TLSv1.3"),
            TlsVersion(raw) => write!(f, "0x{:04x}", raw),
        }
    }
}

impl From<rustls::ProtocolVersion> for TlsVersion {
    fn from(version: rustls::ProtocolVersion) -> Self {
        Self(u16::from(version))
    }
}

/// Negotiated parameters of a TLS session.
///
/// `TlsState::default()` is the zero value: its version is
/// [`TlsVersion::UNSET`] and every other field is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsState {
    pub version: TlsVersion,
    pub cipher_suite: Option<CipherSuite>,
    pub handshake_complete: bool,
    /// SNI name sent by the client, when known.
    pub server_name: Option<String>,
    pub alpn_protocol: Option<Vec<u8>>,
    /// Peer certificate chain, leaf first.
    pub peer_certificates: Vec<CertificateDer<'static>>,
}

impl TlsState {
    /// Leaf certificate presented by the peer, if any.
    pub fn peer_certificate(&self) -> Option<&CertificateDer<'static>> {
        self.peer_certificates.first()
    }

    pub(crate) fn with_server_name(mut self, name: Option<&str>) -> Self {
        self.server_name = name.map(str::to_owned);
        self
    }
}

impl From<&CommonState> for TlsState {
    fn from(common: &CommonState) -> Self {
        Self {
            version: common
                .protocol_version()
                .map(TlsVersion::from)
                .unwrap_or(TlsVersion::UNSET),
            cipher_suite: common.negotiated_cipher_suite().map(|s| s.suite()),
            handshake_complete: !common.is_handshaking(),
            server_name: None,
            alpn_protocol: common.alpn_protocol().map(<[u8]>::to_vec),
            peer_certificates: common
                .peer_certificates()
                .map(|certs| certs.iter().map(|c| c.clone().into_owned()).collect())
                .unwrap_or_default(),
        }
    }
}

/// Something that can report the state of a TLS connection.
///
/// Permissive transports that carry either TLS or plaintext behind one type
/// may implement this and return `TlsState::default()` for plaintext
/// sessions or before the handshake has negotiated a version.
pub trait TlsConnectionState {
    fn connection_state(&self) -> TlsState;
}

impl TlsConnectionState for rustls::ServerConnection {
    fn connection_state(&self) -> TlsState {
        let common: &CommonState = self;
        TlsState::from(common).with_server_name(self.server_name())
    }
}

impl TlsConnectionState for rustls::ClientConnection {
    fn connection_state(&self) -> TlsState {
        let common: &CommonState = self;
        TlsState::from(common)
    }
}

impl<IO> TlsConnectionState for tokio_rustls::server::TlsStream<IO> {
    fn connection_state(&self) -> TlsState {
        self.get_ref().1.connection_state()
    }
}

impl<IO> TlsConnectionState for tokio_rustls::client::TlsStream<IO> {
    fn connection_state(&self) -> TlsState {
        self.get_ref().1.connection_state()
    }
}
