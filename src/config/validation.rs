//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not of the form host:port")]
    InvalidBindAddress(String),
    #[error("listener.tls.{0} must not be empty")]
    EmptyTlsPath(&'static str),
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_bind_address(&config.listener.bind_address) {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("cert_path"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("key_path"));
        }
        if tls.handshake_timeout_ms == 0 {
            errors.push(ValidationError::ZeroTimeout("listener.tls.handshake_timeout_ms"));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An IP socket address, or `host:port` with a hostname left for the
/// listener to resolve.
fn is_bind_address(address: &str) -> bool {
    if address.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match address.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty()
                && !host.contains(|c: char| c.is_whitespace() || c == ':' || c == '[' || c == ']')
                && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{TlsConfig, TlsMode};

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn bind_address_accepts_hostnames() {
        for address in ["localhost:8080", "0.0.0.0:0", "[::1]:8443", "svc.internal:443"] {
            let mut config = ServerConfig::default();
            config.listener.bind_address = address.into();
            assert_eq!(validate_config(&config), Ok(()), "{address}");
        }
    }

    #[test]
    fn bind_address_needs_host_and_port() {
        for address in ["localhost", ":8080", "localhost:http", "::1:8080", "my host:80"] {
            let mut config = ServerConfig::default();
            config.listener.bind_address = address.into();
            assert_eq!(
                validate_config(&config),
                Err(vec![ValidationError::InvalidBindAddress(address.into())]),
            );
        }
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "localhost".into();
        config.listener.tls = Some(TlsConfig {
            cert_path: "".into(),
            key_path: "key.pem".into(),
            mode: TlsMode::Required,
            handshake_timeout_ms: 0,
        });
        config.timeouts.request_secs = 0;
        config.observability.log_level = "verbose".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidBindAddress("localhost".into()),
                ValidationError::EmptyTlsPath("cert_path"),
                ValidationError::ZeroTimeout("listener.tls.handshake_timeout_ms"),
                ValidationError::ZeroTimeout("timeouts.request_secs"),
                ValidationError::UnknownLogLevel("verbose".into()),
            ]
        );
    }
}
