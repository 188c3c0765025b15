//! In-memory TTL cache shared by every fetch path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) > self.ttl
    }
}

#[derive(Debug)]
struct CacheInner<V> {
    map: HashMap<String, CacheEntry<V>>,
}

impl<V: Clone> CacheInner<V> {
    fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    fn get(&self, key: &str, now: Instant) -> Lookup<V> {
        match self.map.get(key) {
            None => Lookup::Miss,
            Some(entry) if entry.is_expired(now) => Lookup::Expired,
            Some(entry) => Lookup::Hit(entry.value.clone()),
        }
    }

    fn put(&mut self, key: String, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
            ttl,
        };
        self.map.insert(key, entry);
    }

    fn evict_if_expired(&mut self, key: &str, now: Instant) {
        if self.map.get(key).is_some_and(|entry| entry.is_expired(now)) {
            self.map.remove(key);
        }
    }
}

enum Lookup<V> {
    Hit(V),
    Expired,
    Miss,
}

/// Thread-safe in-memory cache with a TTL per entry.
///
/// Expired entries are treated as absent and evicted lazily on the next
/// lookup of the same key. Clones share the same underlying map.
#[derive(Debug)]
pub struct CacheStore<V> {
    inner: Arc<tokio::sync::RwLock<CacheInner<V>>>,
}

impl<V> Clone for CacheStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> CacheStore<V> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner::new())),
        }
    }

    /// Get a cached value if it exists and hasn't expired.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let lookup = self.inner.read().await.get(key, now);

        match lookup {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss => None,
            Lookup::Expired => {
                self.inner.write().await.evict_if_expired(key, now);
                None
            }
        }
    }

    /// Store `value` under `key` for `ttl`. A zero TTL stores nothing.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        self.inner.write().await.put(key.into(), value, ttl);
    }

    /// Drop a single entry regardless of its age.
    pub async fn invalidate(&self, key: &str) {
        self.inner.write().await.map.remove(key);
    }

    /// Clear all entries from the cache.
    pub async fn clear(&self) {
        self.inner.write().await.map.clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
