//! Identity cache for entity handles.
//!
//! Every entity kind (room, contact, message) gets one [`IdentityCache`] per
//! client session. The cache guarantees that at most one live handle exists
//! for any identifier: two lookups of the same id return the same `Arc`, even
//! when they race on different threads.
//!
//! # Eviction
//!
//! A cache is unbounded by default. With a capacity set, inserting past the
//! limit evicts entries that nobody outside the cache still holds. A handle a
//! caller is using mid-operation is never evicted, so the one-handle-per-id
//! guarantee holds for every handle that is actually alive.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

/// An entity handle that can live in an [`IdentityCache`].
pub trait Entity: Send + Sync + 'static {
    /// Short name of the entity kind, used in logs and errors.
    const KIND: &'static str;

    /// Returns the handle's identifier.
    fn id(&self) -> &str;
}

/// Map from identifier to shared entity handle.
pub struct IdentityCache<E> {
    /// Maximum number of entries before unreferenced ones are evicted (0 = unbounded).
    capacity: usize,
    entries: RwLock<HashMap<String, Arc<E>>>,
}

impl<E: Entity> IdentityCache<E> {
    /// Creates an unbounded cache.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a cache that evicts unreferenced handles above `capacity` entries.
    ///
    /// A capacity of `0` means unbounded.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the handle for `id`, constructing it with `make` on a miss.
    ///
    /// A hit returns the cached handle untouched. `make` runs at most once per
    /// identifier for the lifetime of the entry, and runs while the cache is
    /// locked, so it must not call back into this cache.
    pub fn get_or_create<F>(&self, id: &str, make: F) -> Arc<E>
    where
        F: FnOnce(String) -> E,
    {
        if let Some(existing) = self.entries.read().get(id) {
            return Arc::clone(existing);
        }

        let mut entries = self.entries.write();
        // Another caller may have inserted between the two locks.
        if let Some(existing) = entries.get(id) {
            return Arc::clone(existing);
        }

        let handle = Arc::new(make(id.to_string()));
        entries.insert(id.to_string(), Arc::clone(&handle));
        trace!(kind = E::KIND, id = %id, "Created entity handle");

        if self.capacity > 0 && entries.len() > self.capacity {
            Self::evict_unreferenced(&mut entries, self.capacity, id);
        }

        handle
    }

    /// Returns the cached handle for `id` without creating one.
    pub fn get(&self, id: &str) -> Option<Arc<E>> {
        self.entries.read().get(id).cloned()
    }

    /// Returns true if a handle for `id` is cached.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Returns the number of cached handles.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache holds no handles.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the cached identifiers, in no particular order.
    pub fn ids(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Drops every cached handle.
    ///
    /// Handles still held by callers stay valid; a later lookup creates a new one.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let count = entries.len();
        entries.clear();
        debug!(kind = E::KIND, count = count, "Cleared identity cache");
    }

    /// Returns the configured capacity (0 = unbounded).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_unreferenced(entries: &mut HashMap<String, Arc<E>>, capacity: usize, keep: &str) {
        let mut excess = entries.len() - capacity;
        let before = entries.len();

        entries.retain(|key, handle| {
            // strong_count == 1 means only the cache holds the handle.
            if excess == 0 || key == keep || Arc::strong_count(handle) > 1 {
                return true;
            }
            excess -= 1;
            false
        });

        debug!(
            kind = E::KIND,
            evicted = before - entries.len(),
            remaining = entries.len(),
            "Evicted unreferenced entity handles"
        );
    }
}

impl<E: Entity> Default for IdentityCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> fmt::Debug for IdentityCache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityCache")
            .field("kind", &E::KIND)
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Debug)]
    struct TestEntity {
        id: String,
    }

    impl Entity for TestEntity {
        const KIND: &'static str = "test";

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn make(id: String) -> TestEntity {
        TestEntity { id }
    }

    #[test]
    fn test_same_id_returns_same_handle() {
        let cache = IdentityCache::new();
        let a = cache.get_or_create("R1", make);
        let b = cache.get_or_create("R1", make);

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.id(), "R1");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_hit_does_not_call_factory() {
        let cache = IdentityCache::new();
        cache.get_or_create("R1", make);

        let calls = AtomicUsize::new(0);
        cache.get_or_create("R1", |id| {
            calls.fetch_add(1, Ordering::SeqCst);
            make(id)
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_get_does_not_create() {
        let cache: IdentityCache<TestEntity> = IdentityCache::new();
        assert!(cache.get("R1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_lookup_creates_one_handle() {
        const THREADS: usize = 16;

        let cache = IdentityCache::new();
        let created = AtomicUsize::new(0);
        let barrier = Barrier::new(THREADS);

        let handles: Vec<Arc<TestEntity>> = thread::scope(|s| {
            let workers: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        cache.get_or_create("R1", |id| {
                            created.fetch_add(1, Ordering::SeqCst);
                            make(id)
                        })
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_keeps_referenced_handles() {
        let cache = IdentityCache::with_capacity(2);
        let held = cache.get_or_create("A", make);
        cache.get_or_create("B", make);
        cache.get_or_create("C", make);

        // B was the only unreferenced entry other than the new one.
        assert_eq!(cache.len(), 2);
        assert!(cache.contains("A"));
        assert!(!cache.contains("B"));
        assert!(cache.contains("C"));

        let again = cache.get_or_create("A", make);
        assert!(Arc::ptr_eq(&held, &again));
    }

    #[test]
    fn test_eviction_may_exceed_capacity_when_all_referenced() {
        let cache = IdentityCache::with_capacity(1);
        let _a = cache.get_or_create("A", make);
        let _b = cache.get_or_create("B", make);

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clear() {
        let cache = IdentityCache::new();
        let before = cache.get_or_create("R1", make);
        cache.clear();
        assert!(cache.is_empty());

        let after = cache.get_or_create("R1", make);
        assert!(!Arc::ptr_eq(&before, &after));
    }
}
