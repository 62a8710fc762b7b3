//! Immutable cached snapshots.

use std::any::{Any, type_name};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::CacheKey;

/// One cached collection for a key.
///
/// Entries are never mutated: a refresh builds a new entry and swaps the
/// `Arc` in the entry map, so readers always see a whole collection.
pub struct CacheEntry {
    key: CacheKey,
    /// Always an `Arc<Vec<T>>` erased to `Any`.
    payload: Arc<dyn Any + Send + Sync>,
    payload_type: &'static str,
    size: usize,
    fetched_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    pub fn new<T>(key: CacheKey, items: Vec<T>, fetched_at: DateTime<Utc>, ttl: Duration) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self {
            key,
            size: items.len(),
            payload: Arc::new(items),
            payload_type: type_name::<T>(),
            fetched_at,
            ttl,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Typed view of the payload, or `None` if it holds another entity type.
    pub fn items<T>(&self) -> Option<Arc<Vec<T>>>
    where
        T: Send + Sync + 'static,
    {
        Arc::clone(&self.payload).downcast::<Vec<T>>().ok()
    }

    pub fn payload_type(&self) -> &'static str {
        self.payload_type
    }

    /// Number of entities in the payload.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Age at `now`. Clock skew never yields a negative age.
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        (now - self.fetched_at).max(TimeDelta::zero())
    }

    /// `now - fetched_at > ttl`.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        let ttl = TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX);
        now - self.fetched_at > ttl
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("payload_type", &self.payload_type)
            .field("size", &self.size)
            .field("fetched_at", &self.fetched_at)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Family;

    fn entry(fetched_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry::new(
            CacheKey::all(Family::Location),
            vec!["a".to_string(), "b".to_string()],
            fetched_at,
            Duration::from_secs(300),
        )
    }

    #[test]
    fn test_staleness_boundary() {
        let t0 = Utc::now();
        let e = entry(t0);
        assert!(!e.is_stale(t0));
        assert!(!e.is_stale(t0 + TimeDelta::seconds(300)));
        assert!(e.is_stale(t0 + TimeDelta::seconds(301)));
    }

    #[test]
    fn test_typed_payload() {
        let e = entry(Utc::now());
        assert_eq!(e.size(), 2);
        assert_eq!(e.items::<String>().unwrap().as_slice(), ["a", "b"]);
        assert!(e.items::<u32>().is_none());
    }

    #[test]
    fn test_age_never_negative() {
        let t0 = Utc::now();
        let e = entry(t0);
        assert_eq!(e.age(t0 - TimeDelta::seconds(5)), TimeDelta::zero());
        assert_eq!(e.age(t0 + TimeDelta::seconds(42)).num_seconds(), 42);
    }
}
