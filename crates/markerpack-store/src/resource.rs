//! Cached access to auxiliary pack resources.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::{normalize_path, DataStore};

/// Access to binary resources referenced by pack content (trail files,
/// textures, icons).
pub trait ResourceProvider: Send + Sync {
    /// Check whether a resource exists.
    fn resource_exists(&self, path: &str) -> bool;

    /// Load a resource.
    ///
    /// Returns `None` if the resource is missing or cannot be read.
    fn load_resource(&self, path: &str) -> Option<Arc<[u8]>>;
}

/// Resource cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceCacheSettings {
    /// Maximum number of resources kept in memory.
    pub capacity: usize,
}

impl ResourceCacheSettings {
    /// Default number of cached resources.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Set the cache capacity (at least one entry is always kept).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

impl Default for ResourceCacheSettings {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
        }
    }
}

/// Resource loader with a bounded, case-insensitive cache.
///
/// Entries are keyed by normalized path. A miss is fetched while the cache
/// lock is held, so concurrent requests for the same path trigger a single
/// read. Evicted entries are read again from the store on next use.
pub struct PackResourceManager {
    store: Arc<dyn DataStore>,
    cache: Mutex<LruCache<String, Arc<[u8]>>>,
    fetches: AtomicUsize,
}

impl PackResourceManager {
    /// Create a manager with the default cache size.
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self::with_settings(store, ResourceCacheSettings::default())
    }

    /// Create a manager with explicit cache settings.
    pub fn with_settings(store: Arc<dyn DataStore>, settings: ResourceCacheSettings) -> Self {
        let capacity = NonZeroUsize::new(settings.capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            store,
            cache: Mutex::new(LruCache::new(capacity)),
            fetches: AtomicUsize::new(0),
        }
    }

    /// The backing store.
    #[inline]
    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.store
    }

    /// Number of reads issued against the backing store so far.
    #[inline]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Number of resources currently cached.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Drop every cached resource.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

impl std::fmt::Debug for PackResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackResourceManager")
            .field("store", &self.store.name())
            .field("cached", &self.cached_len())
            .field("fetches", &self.fetch_count())
            .finish()
    }
}

impl ResourceProvider for PackResourceManager {
    fn resource_exists(&self, path: &str) -> bool {
        self.cache.lock().contains(&normalize_path(path)) || self.store.exists(path)
    }

    fn load_resource(&self, path: &str) -> Option<Arc<[u8]>> {
        let key = normalize_path(path);
        let mut cache = self.cache.lock();

        if let Some(data) = cache.get(&key) {
            return Some(Arc::clone(data));
        }

        self.fetches.fetch_add(1, Ordering::Relaxed);
        match self.store.read_bytes(path) {
            Ok(Some(bytes)) => {
                let data: Arc<[u8]> = Arc::from(bytes);
                cache.put(key, Arc::clone(&data));
                Some(data)
            }
            Ok(None) => {
                tracing::debug!(resource = path, "resource not found in pack");
                None
            }
            Err(e) => {
                tracing::warn!(resource = path, error = %e, "failed to read pack resource");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn manager(capacity: usize) -> PackResourceManager {
        let store = MemoryStore::from_files(
            "mem",
            [("Trails/A.trl", vec![1u8; 4]), ("b.png", vec![2u8; 2]), ("c.png", vec![3u8])],
        );
        PackResourceManager::with_settings(
            Arc::new(store),
            ResourceCacheSettings::default().with_capacity(capacity),
        )
    }

    #[test]
    fn test_cache_hit_avoids_refetch() {
        let resources = manager(4);

        let first = resources.load_resource("trails/a.trl").unwrap();
        let second = resources.load_resource("TRAILS\\A.TRL").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resources.fetch_count(), 1);
    }

    #[test]
    fn test_evicted_entries_are_refetched() {
        let resources = manager(1);

        resources.load_resource("b.png").unwrap();
        resources.load_resource("c.png").unwrap();
        assert_eq!(resources.cached_len(), 1);

        let again = resources.load_resource("b.png").unwrap();
        assert_eq!(&*again, &[2u8, 2]);
        assert_eq!(resources.fetch_count(), 3);
    }

    #[test]
    fn test_missing_resource() {
        let resources = manager(4);
        assert!(!resources.resource_exists("nope.trl"));
        assert!(resources.load_resource("nope.trl").is_none());
        assert_eq!(resources.cached_len(), 0);
    }

    #[test]
    fn test_zero_capacity_still_caches_one() {
        let resources = manager(0);
        resources.load_resource("b.png").unwrap();
        resources.load_resource("b.png").unwrap();
        assert_eq!(resources.fetch_count(), 1);
    }

    #[test]
    fn test_shared_across_threads() {
        let resources = Arc::new(manager(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resources = Arc::clone(&resources);
                std::thread::spawn(move || resources.load_resource("Trails/A.trl").unwrap().len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 4);
        }
        assert_eq!(resources.fetch_count(), 1);
    }
}
