//! Payload storage shared by every entity handle.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};

/// An entity's optional payload plus the lock serializing its hydration.
///
/// Readers never wait on hydration: [`get`](Self::get) clones the current
/// `Arc` under a short synchronous lock. Hydration holds the async
/// [`sync`](Self::sync) guard across its puppet calls so concurrent `ready`
/// calls on one handle queue up instead of racing.
pub(crate) struct PayloadSlot<P> {
    payload: RwLock<Option<Arc<P>>>,
    sync: Mutex<()>,
}

impl<P> PayloadSlot<P> {
    pub(crate) fn new() -> Self {
        Self {
            payload: RwLock::new(None),
            sync: Mutex::new(()),
        }
    }

    pub(crate) fn get(&self) -> Option<Arc<P>> {
        self.payload.read().clone()
    }

    pub(crate) fn is_set(&self) -> bool {
        self.payload.read().is_some()
    }

    pub(crate) fn set(&self, payload: P) -> Arc<P> {
        let payload = Arc::new(payload);
        *self.payload.write() = Some(Arc::clone(&payload));
        payload
    }

    pub(crate) fn clear(&self) {
        *self.payload.write() = None;
    }

    /// Waits for exclusive hydration rights on this handle.
    pub(crate) async fn sync(&self) -> MutexGuard<'_, ()> {
        self.sync.lock().await
    }
}
