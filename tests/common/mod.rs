//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use conninfo::config::{ServerConfig, TlsMode};
use conninfo::http::WhoAmI;
use conninfo::lifecycle::Shutdown;
use conninfo::net::tls::acceptor_from_der;
use conninfo::HttpServer;
use rustls::pki_types::CertificateDer;
use tokio::net::TcpListener;
use tokio_rustls::{TlsAcceptor, TlsConnector};

/// Self-signed certificate for "localhost".
#[allow(dead_code)]
pub struct TestIdentity {
    pub cert_der: Vec<u8>,
    pub key_der: Vec<u8>,
}

#[allow(dead_code)]
impl TestIdentity {
    pub fn generate() -> Self {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        Self {
            cert_der: cert.cert.der().to_vec(),
            key_der: cert.key_pair.serialize_der(),
        }
    }

    pub fn acceptor(&self) -> TlsAcceptor {
        acceptor_from_der(self.cert_der.clone(), self.key_der.clone()).unwrap()
    }

    /// Connector trusting only this identity.
    pub fn connector(&self) -> TlsConnector {
        let mut roots = rustls::RootCertStore::empty();
        roots
            .add(CertificateDer::from(self.cert_der.clone()))
            .unwrap();
        let config = rustls::ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_root_certificates(roots)
        .with_no_client_auth();
        TlsConnector::from(Arc::new(config))
    }
}

/// A running server and the handle that stops it.
#[allow(dead_code)]
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a plaintext server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_plain_server() -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    let server = HttpServer::new(ServerConfig::default());
    tokio::spawn(async move {
        let _ = server.run_plain(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    RunningServer { addr, shutdown }
}

/// Start a TLS server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_tls_server(identity: &TestIdentity, mode: TlsMode) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    let server = HttpServer::new(ServerConfig::default());
    let acceptor = identity.acceptor();
    tokio::spawn(async move {
        let _ = server
            .run_tls(listener, acceptor, mode, Duration::from_secs(5), rx)
            .await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    RunningServer { addr, shutdown }
}

/// HTTP client that accepts the self-signed test certificate.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .use_rustls_tls()
        .danger_accept_invalid_certs(true)
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[allow(dead_code)]
pub async fn whoami(url: String) -> WhoAmI {
    let res = client().get(url).send().await.expect("Server unreachable");
    assert_eq!(res.status(), 200);
    res.json().await.unwrap()
}
