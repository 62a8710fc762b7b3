//! Registry of named record caches.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use anyhow::{Result, bail};
use parking_lot::RwLock;
use tracing::{debug, info};

use super::{CacheConfig, RecordCacheStats, TypedCache};

/// Central registry of the repositories' record caches.
///
/// Repositories ask for their cache by name; asking twice for the same name
/// and types returns the same cache, which lets the stats endpoint and the
/// clear operation reach every record cache.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<String, Registered>>>,
}

/// Type-erased cache plus the hooks the registry needs without knowing K/V.
struct Registered {
    cache: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
    stats: Box<dyn Fn() -> RecordCacheStats + Send + Sync>,
    clear: Box<dyn Fn() + Send + Sync>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        info!("Cache registry initialized");
        Self::default()
    }

    /// Get the cache registered under `name`, creating it with `config` if
    /// it does not exist yet.
    ///
    /// # Errors
    /// Fails if `name` is already registered with different key/value types.
    pub fn get_or_create<K, V>(&self, name: &str, config: CacheConfig) -> Result<TypedCache<K, V>>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let mut caches = self.caches.write();

        if let Some(existing) = caches.get(name) {
            return match existing.cache.downcast_ref::<TypedCache<K, V>>() {
                Some(cache) => Ok(cache.clone()),
                None => bail!(
                    "Cache '{}' already exists with different types: expected {}, got {}",
                    name,
                    type_name::<TypedCache<K, V>>(),
                    existing.type_name
                ),
            };
        }

        debug!("Creating record cache: {}", name);
        let cache: TypedCache<K, V> = TypedCache::new(name, config);
        let for_stats = cache.clone();
        let for_clear = cache.clone();

        caches.insert(
            name.to_string(),
            Registered {
                cache: Box::new(cache.clone()),
                type_name: type_name::<TypedCache<K, V>>(),
                stats: Box::new(move || for_stats.stats()),
                clear: Box::new(move || for_clear.invalidate_all()),
            },
        );

        Ok(cache)
    }

    /// Stats of every registered cache, ordered by name.
    pub fn stats(&self) -> Vec<RecordCacheStats> {
        let caches = self.caches.read();
        let mut stats: Vec<RecordCacheStats> = caches.values().map(|entry| (entry.stats)()).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// Empty every registered cache.
    pub fn clear_all(&self) {
        let caches = self.caches.read();
        for entry in caches.values() {
            (entry.clear)();
        }
        debug!("Cleared {} record caches", caches.len());
    }

    pub fn len(&self) -> usize {
        self.caches.read().len()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caches = self.caches.read();
        let mut names: Vec<&String> = caches.keys().collect();
        names.sort();
        f.debug_struct("CacheRegistry").field("caches", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_returns_same_cache() {
        let registry = CacheRegistry::new();
        let a: TypedCache<String, u32> = registry.get_or_create("depots", CacheConfig::bounded(100)).unwrap();
        let b: TypedCache<String, u32> = registry.get_or_create("depots", CacheConfig::bounded(100)).unwrap();

        a.insert("D1".to_string(), 1);
        assert_eq!(b.get(&"D1".to_string()), Some(1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let registry = CacheRegistry::new();
        let _: TypedCache<String, u32> = registry.get_or_create("depots", CacheConfig::bounded(100)).unwrap();
        let result: Result<TypedCache<u64, u32>> = registry.get_or_create("depots", CacheConfig::bounded(100));
        assert!(result.is_err());
    }

    #[test]
    fn test_stats_and_clear_reach_every_cache() {
        let registry = CacheRegistry::new();
        let depots: TypedCache<String, u32> = registry.get_or_create("depots", CacheConfig::bounded(100)).unwrap();
        let lines: TypedCache<String, u32> = registry.get_or_create("shipping_lines", CacheConfig::lookup()).unwrap();
        depots.insert("D1".to_string(), 1);
        lines.insert("MSK".to_string(), 2);
        depots.get(&"D1".to_string());

        let stats = registry.stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].name, "depots");
        assert_eq!(stats[0].hits, 1);

        registry.clear_all();
        assert_eq!(depots.get(&"D1".to_string()), None);
        assert_eq!(lines.get(&"MSK".to_string()), None);
    }
}
