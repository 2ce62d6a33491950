//! Bounded lookup cache.
//!
//! Least-recently-used eviction once `capacity` entries are held, with an
//! optional time-to-live after which an entry is treated as absent.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::sync::Mutex;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// LRU cache shared between concurrent callers.
pub struct LookupCache<K: Hash + Eq, V: Clone> {
    entries: Mutex<LruCache<K, Entry<V>>>,
    ttl: Option<Duration>,
}

impl<K: Hash + Eq, V: Clone> LookupCache<K, V> {
    /// Creates a cache holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: None,
        }
    }

    /// Expires entries `ttl` after insertion.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Returns a live entry and marks it most recently used.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => self
                .ttl
                .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl),
        };
        if expired {
            entries.pop(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    /// Inserts or replaces an entry, evicting the least recently used one when full.
    pub async fn insert(&self, key: K, value: V) {
        self.entries.lock().await.put(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_least_recently_used_entry_is_evicted() {
        let cache = LookupCache::new(2);
        cache.insert("dublin", "207931").await;
        cache.insert("cork", "207932").await;
        assert_eq!(cache.get(&"dublin").await, Some("207931"));

        cache.insert("galway", "207933").await;

        assert_eq!(cache.get(&"cork").await, None);
        assert_eq!(cache.get(&"dublin").await, Some("207931"));
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let cache = LookupCache::new(4).with_ttl(Duration::from_millis(20));
        cache.insert(1, "a").await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.get(&1).await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_capacity_still_holds_one_entry() {
        let cache = LookupCache::new(0);
        cache.insert(1, 1).await;
        cache.insert(2, 2).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&2).await, Some(2));
    }
}
