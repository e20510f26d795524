//! Per-request execution context.
//!
//! # Data Flow
//! ```text
//! Dispatch layer
//!     → Context::background()
//!     → with_conn_info(&ctx, info) (child frame, parent untouched)
//!     → handler receives the child context
//!     → conn_info_from_context(&ctx) searches innermost frame outward
//! ```
//!
//! # Design Decisions
//! - Contexts are persistent chains of `Arc` frames, never mutated
//! - Slots are keyed by type; a module owning a private key type owns the slot
//! - Sibling tasks share ancestor frames without synchronization

mod conn_info;

pub use conn_info::{conn_info_from_context, with_conn_info};

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Key type for a context slot.
///
/// The key is the implementing type itself. Keep key types private to the
/// module that owns the slot so nothing else can read or shadow it.
pub trait ContextKey: 'static {
    type Value: Send + Sync + 'static;
}

struct Frame {
    key: TypeId,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<Frame>>,
}

impl Drop for Frame {
    // Unlink iteratively; a recursive drop overflows the stack on deep chains.
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(frame) = next {
            next = Arc::try_unwrap(frame)
                .ok()
                .and_then(|mut frame| frame.parent.take());
        }
    }
}

/// Immutable chain of scoped values carried with a request.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Frame>>,
}

impl Context {
    /// The empty root context.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a child context holding `value` under key `K`.
    pub fn with_value<K: ContextKey>(&self, value: K::Value) -> Context {
        Context {
            head: Some(Arc::new(Frame {
                key: TypeId::of::<K>(),
                value: Arc::new(value),
                parent: self.head.clone(),
            })),
        }
    }

    /// Look up the innermost value stored under key `K`.
    pub fn value<K: ContextKey>(&self) -> Option<&K::Value> {
        let key = TypeId::of::<K>();
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            if f.key == key {
                return f.value.downcast_ref::<K::Value>();
            }
            frame = f.parent.as_deref();
        }
        None
    }

    /// Number of frames between this context and the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            depth += 1;
            frame = f.parent.as_deref();
        }
        depth
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("depth", &self.depth()).finish()
    }
}
