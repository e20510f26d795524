//! Binding of connection info into a request context.

use crate::context::{Context, ContextKey};
use crate::net::connection::ConnInfo;

/// Slot key for connection info. Uninhabited and private to this module.
enum ConnInfoKey {}

impl ContextKey for ConnInfoKey {
    type Value = ConnInfo;
}

/// Derive a context carrying `info`. The parent context is unchanged.
pub fn with_conn_info(ctx: &Context, info: ConnInfo) -> Context {
    tracing::trace!(conn = %info, "Binding connection info");
    ctx.with_value::<ConnInfoKey>(info)
}

/// Extract connection info bound on `ctx` or one of its ancestors.
///
/// When nothing was bound the flag is `false` and the returned value is
/// `ConnInfo::default()`; check the flag rather than the fields.
pub fn conn_info_from_context(ctx: &Context) -> (ConnInfo, bool) {
    match ctx.conn_info() {
        Some(info) => (info.clone(), true),
        None => (ConnInfo::default(), false),
    }
}

impl Context {
    /// Connection info bound on this context, if any.
    pub fn conn_info(&self) -> Option<&ConnInfo> {
        self.value::<ConnInfoKey>()
    }

    /// Shorthand for [`with_conn_info`].
    pub fn with_conn_info(&self, info: ConnInfo) -> Context {
        with_conn_info(self, info)
    }
}
