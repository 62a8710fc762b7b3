//! Sizing and expiry of the moka record caches.

use std::time::Duration;

/// Bound and expiry policy for one record cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub capacity: u64,
    /// Evict this long after insertion.
    pub time_to_live: Option<Duration>,
    /// Evict this long after the last read.
    pub time_to_idle: Option<Duration>,
}

impl CacheConfig {
    /// At most `capacity` entries, no expiry.
    pub const fn bounded(capacity: u64) -> Self {
        Self {
            capacity,
            time_to_live: None,
            time_to_idle: None,
        }
    }

    #[must_use]
    pub const fn live_for(mut self, duration: Duration) -> Self {
        self.time_to_live = Some(duration);
        self
    }

    #[must_use]
    pub const fn idle_for(mut self, duration: Duration) -> Self {
        self.time_to_idle = Some(duration);
        self
    }

    /// Per-document cache of containers and depots.
    /// Containers move between depots often, so entries also idle out.
    pub const fn records() -> Self {
        Self::bounded(20_000)
            .live_for(Duration::from_secs(10 * 60))
            .idle_for(Duration::from_secs(2 * 60))
    }

    /// Whole-list cache for small reference collections.
    pub const fn lookup() -> Self {
        Self::bounded(16).live_for(Duration::from_secs(60 * 60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let records = CacheConfig::records();
        assert_eq!(records.capacity, 20_000);
        assert_eq!(records.time_to_idle, Some(Duration::from_secs(120)));

        let lookup = CacheConfig::lookup();
        assert_eq!(lookup.time_to_live, Some(Duration::from_secs(3600)));
        assert_eq!(lookup.time_to_idle, None);
    }

    #[test]
    fn test_live_for_overrides_preset() {
        let listing = CacheConfig::lookup().live_for(Duration::from_secs(300));
        assert_eq!(listing.capacity, 16);
        assert_eq!(listing.time_to_live, Some(Duration::from_secs(300)));
    }
}
