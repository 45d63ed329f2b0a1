//! Fan-out event dispatcher for local consumers.
//!
//! DESIGN
//! ======
//! Where a hub connection keeps one handler per server target, the
//! dispatcher lets any number of local consumers observe an event name.
//! Handlers fire in registration order. Removal is by handle identity:
//! `off` takes the same [`Handler`] that was passed to `on`, compared by
//! pointer, so two closures with identical code never unsubscribe each
//! other.
//!
//! A panicking handler is isolated: the panic is caught and logged, and
//! the remaining handlers for that event still run.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::error;

/// Shared callback handle. Keep a clone to unsubscribe later.
pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Wrap a closure into a [`Handler`].
pub fn handler(f: impl Fn(&Value) + Send + Sync + 'static) -> Handler {
    Arc::new(f)
}

/// Multi-consumer event dispatcher. Clones share the same handler table.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: Arc<Mutex<HashMap<String, Vec<Handler>>>>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to `event`. The same handle may be registered
    /// for several events.
    pub fn on(&self, event: &str, handler: &Handler) {
        self.lock()
            .entry(event.to_owned())
            .or_default()
            .push(Arc::clone(handler));
    }

    /// Unsubscribe by handle identity. Unknown event or handle is a no-op.
    pub fn off(&self, event: &str, handler: &Handler) {
        let mut handlers = self.lock();
        if let Some(list) = handlers.get_mut(event) {
            list.retain(|h| !Arc::ptr_eq(h, handler));
            if list.is_empty() {
                handlers.remove(event);
            }
        }
    }

    /// Invoke every handler registered for `event`, in registration order.
    /// The handler list is snapshotted first, so handlers may subscribe or
    /// unsubscribe from inside a callback without deadlocking; such
    /// changes take effect from the next emit.
    pub fn emit(&self, event: &str, data: &Value) {
        let snapshot = self.lock().get(event).cloned().unwrap_or_default();
        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(data))).is_err() {
                error!(event, "event handler panicked");
            }
        }
    }

    /// Number of handlers currently registered for `event`.
    #[must_use]
    pub fn handler_count(&self, event: &str) -> usize {
        self.lock().get(event).map_or(0, Vec::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Handler>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
