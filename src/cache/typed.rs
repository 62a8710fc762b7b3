//! Moka-backed record cache used by the MongoDB repositories.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;

use super::{CacheConfig, RecordCacheStats};

/// Bounded, expiring cache of locally stored records, with hit/miss
/// counters. Clones share the cache and the counters.
pub struct TypedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    shared: Arc<Shared<K, V>>,
}

struct Shared<K, V> {
    name: String,
    records: Cache<K, V>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> Clone for TypedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, V> TypedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.capacity);
        if let Some(ttl) = config.time_to_live {
            builder = builder.time_to_live(ttl);
        }
        if let Some(tti) = config.time_to_idle {
            builder = builder.time_to_idle(tti);
        }

        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                records: builder.build(),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.shared.records.insert(key, value);
    }

    /// Read-through lookup; counts a hit or a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let found = self.shared.records.get(key);
        let counter = match found {
            Some(_) => &self.shared.hits,
            None => &self.shared.misses,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn invalidate(&self, key: &K) {
        self.shared.records.invalidate(key);
    }

    pub fn invalidate_all(&self) {
        self.shared.records.invalidate_all();
    }

    pub fn stats(&self) -> RecordCacheStats {
        RecordCacheStats {
            name: self.shared.name.clone(),
            // Approximate: moka applies pending writes lazily.
            entries: self.shared.records.entry_count(),
            hits: self.shared.hits.load(Ordering::Relaxed),
            misses: self.shared.misses.load(Ordering::Relaxed),
        }
    }
}

impl<K, V> fmt::Debug for TypedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedCache")
            .field("name", &self.shared.name)
            .field("entries", &self.shared.records.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_hits_and_misses() {
        let cache: TypedCache<String, u32> = TypedCache::new("depots", CacheConfig::records());

        assert_eq!(cache.get(&"D1".to_string()), None);
        cache.insert("D1".to_string(), 7);
        assert_eq!(cache.get(&"D1".to_string()), Some(7));

        let stats = cache.stats();
        assert_eq!(stats.name, "depots");
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_invalidate() {
        let cache: TypedCache<u8, u8> = TypedCache::new("t", CacheConfig::bounded(8));
        cache.insert(1, 1);
        cache.insert(2, 2);
        cache.invalidate(&1);
        assert_eq!(cache.get(&1), None);

        cache.invalidate_all();
        assert_eq!(cache.get(&2), None);
    }

    #[test]
    fn test_clones_share_counters() {
        let cache: TypedCache<u8, u8> = TypedCache::new("t", CacheConfig::bounded(8));
        let other = cache.clone();
        other.insert(1, 1);
        assert_eq!(cache.get(&1), Some(1));
        assert_eq!(other.stats().hits, 1);
    }
}
