//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, connection info binding)
//! - Terminate TLS according to the listener config
//! - Serve until the shutdown signal fires

use std::path::Path;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_rustls::TlsAcceptor;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ServerConfig, TlsMode};
use crate::context::{conn_info_from_context, Context};
use crate::error::Error;
use crate::http::middleware::bind_conn_info;
use crate::http::response::WhoAmI;
use crate::lifecycle::shutdown::wait as wait_for_shutdown;
use crate::net::connection::ConnInfo;
use crate::net::listener::TlsListener;
use crate::net::tls::load_tls_acceptor;

/// HTTP server reporting connection information to its callers.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let router = Self::build_router(&config);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig) -> Router {
        Router::new()
            .route("/whoami", get(whoami_handler))
            .route("/healthz", get(|| async { "ok" }))
            .layer(middleware::from_fn(bind_conn_info))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server on `listener`, terminating TLS if the config asks for it.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), Error> {
        match self.config.listener.tls.clone() {
            None => self.run_plain(listener, shutdown).await,
            Some(tls) => {
                let acceptor =
                    load_tls_acceptor(Path::new(&tls.cert_path), Path::new(&tls.key_path))?;
                let timeout = Duration::from_millis(tls.handshake_timeout_ms);
                self.run_tls(listener, acceptor, tls.mode, timeout, shutdown)
                    .await
            }
        }
    }

    /// Serve plaintext HTTP.
    pub async fn run_plain(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = false, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<ConnInfo>();
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS with an already-built acceptor.
    pub async fn run_tls(
        self,
        listener: TcpListener,
        acceptor: TlsAcceptor,
        mode: TlsMode,
        handshake_timeout: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = true, mode = ?mode, "HTTP server starting");

        let listener = TlsListener::new(listener, acceptor, mode, handshake_timeout);
        let app = self.router.into_make_service_with_connect_info::<ConnInfo>();
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve plaintext HTTP on a Unix-domain socket.
    #[cfg(unix)]
    pub async fn run_unix(
        self,
        listener: tokio::net::UnixListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = ?addr, "HTTP server starting on unix socket");

        let app = self.router.into_make_service_with_connect_info::<ConnInfo>();
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The router, for serving through other means (tests, embedding).
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Report the caller's connection as seen by this server.
async fn whoami_handler(request: Request<Body>) -> Response {
    let ctx = request
        .extensions()
        .get::<Context>()
        .cloned()
        .unwrap_or_else(Context::background);

    let (info, found) = conn_info_from_context(&ctx);
    if !found {
        tracing::warn!(path = %request.uri().path(), "Connection info missing from context");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Connection info unavailable").into_response();
    }

    tracing::debug!(conn = %info, tls = info.is_tls(), "Reporting connection info");
    Json(WhoAmI::from(&info)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ConnectInfo;
    use std::net::SocketAddr;
    use tower::ServiceExt;

    fn test_info() -> ConnInfo {
        let local: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let remote: SocketAddr = "10.0.0.5:41000".parse().unwrap();
        ConnInfo::new(local, remote)
    }

    async fn body_json(response: Response) -> WhoAmI {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn whoami_reports_bound_connection() {
        let router = HttpServer::new(ServerConfig::default()).into_router();
        let mut request = Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(test_info()));

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body.remote, "10.0.0.5:41000");
        assert_eq!(body.local, "127.0.0.1:8080");
        assert_eq!(body.display, "10.0.0.5:41000 -> 127.0.0.1:8080");
        assert_eq!(body.tls, None);
    }

    #[tokio::test]
    async fn whoami_without_connect_info_is_server_error() {
        let router = HttpServer::new(ServerConfig::default()).into_router();
        let request = Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn middleware_extends_existing_context() {
        use crate::context::ContextKey;

        enum TenantKey {}
        impl ContextKey for TenantKey {
            type Value = &'static str;
        }

        let router = Router::new()
            .route(
                "/",
                get(|request: Request<Body>| async move {
                    let ctx = request.extensions().get::<Context>().cloned().unwrap();
                    let tenant = ctx.value::<TenantKey>().copied().unwrap_or("none");
                    let conn = ctx.conn_info().map(ToString::to_string).unwrap_or_default();
                    format!("{tenant}|{conn}")
                }),
            )
            .layer(middleware::from_fn(bind_conn_info));

        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        request.extensions_mut().insert(ConnectInfo(test_info()));
        request
            .extensions_mut()
            .insert(Context::background().with_value::<TenantKey>("acme"));

        let response = router.oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"acme|10.0.0.5:41000 -> 127.0.0.1:8080");
    }
}
