//! Network addresses carried by connection info.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Address of one end of a connection.
///
/// Covers IP sockets and Unix-domain sockets. `Unknown` is the zero value,
/// used when a producer had no address to report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NetAddr {
    /// No address available.
    #[default]
    Unknown,
    /// TCP endpoint.
    Tcp(SocketAddr),
    /// Unix-domain socket; unnamed sockets carry no path.
    Unix(Option<PathBuf>),
}

impl NetAddr {
    /// Returns the socket address for TCP endpoints.
    pub fn as_socket_addr(&self) -> Option<SocketAddr> {
        match self {
            NetAddr::Tcp(addr) => Some(*addr),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, NetAddr::Unknown)
    }
}

impl fmt::Display for NetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetAddr::Unknown => f.write_str("unknown"),
            NetAddr::Tcp(addr) => write!(f, "{}", addr),
            NetAddr::Unix(Some(path)) => write!(f, "{}", path.display()),
            NetAddr::Unix(None) => f.write_str("(unnamed)"),
        }
    }
}

impl From<SocketAddr> for NetAddr {
    fn from(addr: SocketAddr) -> Self {
        NetAddr::Tcp(addr)
    }
}

#[cfg(unix)]
impl From<tokio::net::unix::SocketAddr> for NetAddr {
    fn from(addr: tokio::net::unix::SocketAddr) -> Self {
        NetAddr::Unix(addr.as_pathname().map(|p| p.to_path_buf()))
    }
}
