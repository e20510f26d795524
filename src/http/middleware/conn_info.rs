//! Connection info binding middleware.
//! Moves the accepted connection's info into the request context.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::context::Context;
use crate::net::connection::ConnInfo;

/// Bind the connection's `ConnInfo` into the request's `Context`.
///
/// Derives from a `Context` already present in the request extensions, or the
/// background context, and stores the child back. Requests served without
/// connect info pass through untouched.
pub async fn bind_conn_info(mut req: Request<Body>, next: Next) -> Response {
    let info = match req.extensions().get::<ConnectInfo<ConnInfo>>() {
        Some(ConnectInfo(info)) => info.clone(),
        None => {
            tracing::debug!(path = %req.uri().path(), "No connection info on request");
            return next.run(req).await;
        }
    };

    let parent = req
        .extensions()
        .get::<Context>()
        .cloned()
        .unwrap_or_else(Context::background);
    req.extensions_mut().insert(parent.with_conn_info(info));

    next.run(req).await
}
