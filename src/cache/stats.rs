//! Cache statistics, derived on demand.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Family;

/// Snapshot of the entity cache: live entries plus running counters.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: Vec<EntryStats>,
    pub hits: u64,
    pub misses: u64,
    /// Responses served from an expired entry after a failed fetch.
    pub stale_served: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStats {
    pub key: String,
    pub family: Family,
    pub age_seconds: i64,
    pub size: usize,
    pub fetched_at: DateTime<Utc>,
    pub stale: bool,
}

impl CacheStats {
    /// Hit rate in `[0, 1]`; 0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Counters of one moka-backed record cache.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCacheStats {
    pub name: String,
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}
