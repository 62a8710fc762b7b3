//! Entity cache: keyed snapshots of upstream collections.
//!
//! ## Concurrency
//!
//! - `entries` maps a key to its current snapshot. A refresh swaps in a new
//!   `Arc<CacheEntry>`; nothing is ever written into a live entry.
//! - `in_flight` holds at most one pending fetch per key. The first caller
//!   that finds a key missing or stale registers a fetch; later callers clone
//!   the shared future and wait on it. The shard lock is only held for the
//!   check-and-register step, never across the fetch itself.
//! - Fetches run as spawned tasks. A task stores its result, then releases
//!   its slot (also on timeout, error or panic), so a key is never left
//!   locked even if every waiter went away.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use super::{CacheEntry, CacheKey, CacheStats, Clock, EntryStats, Family, SystemClock};
use crate::upstream::FetchError;

type Flight = Shared<BoxFuture<'static, Result<Arc<CacheEntry>, FetchError>>>;

/// Result of [`EntityCache::get_or_populate`].
#[derive(Debug, Clone)]
pub struct Lookup {
    pub entry: Arc<CacheEntry>,
    /// The entry comes from a fetch this call waited on.
    pub refreshed: bool,
    /// The entry is past its TTL; it was served because the fetch failed.
    pub stale: bool,
}

/// Process-wide store of upstream snapshots.
///
/// Cloning is cheap and shares the same store.
#[derive(Clone)]
pub struct EntityCache {
    inner: Arc<Inner>,
}

struct Inner {
    entries: DashMap<CacheKey, Arc<CacheEntry>>,
    in_flight: DashMap<CacheKey, Flight>,
    clock: Arc<dyn Clock>,
    fetch_timeout: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    stale_served: AtomicU64,
}

/// Releases a key's in-flight slot when the fetch task ends, however it ends.
struct FlightGuard {
    inner: Arc<Inner>,
    key: CacheKey,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        // Slots are only inserted into vacant entries, so the slot under this
        // key is always the one owned by this task.
        self.inner.in_flight.remove(&self.key);
    }
}

impl EntityCache {
    /// Create an empty cache on the wall clock. Every fetch is bounded by
    /// `fetch_timeout`.
    pub fn new(fetch_timeout: Duration) -> Self {
        Self::with_clock(fetch_timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(fetch_timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                in_flight: DashMap::new(),
                clock,
                fetch_timeout,
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                stale_served: AtomicU64::new(0),
            }),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    /// Plain lookup; no fetch, no counters.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        self.inner.entries.get(key).map(|e| Arc::clone(e.value()))
    }

    pub fn is_stale(&self, entry: &CacheEntry) -> bool {
        entry.is_stale(self.now())
    }

    fn fresh(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        self.get(key).filter(|entry| !self.is_stale(entry))
    }

    /// Return the fresh entry for `key`, or populate it with `fetch`.
    ///
    /// Concurrent callers for the same missing/stale key share one fetch.
    /// If the fetch fails and an older entry exists, that entry is returned
    /// with `stale` set; otherwise the failure is returned.
    ///
    /// `fetch` is called with the key's in-flight slot locked. It must only
    /// build the future and must not touch this cache; the work belongs in
    /// the returned future, which runs after the lock is released.
    pub async fn get_or_populate<T, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<Lookup, FetchError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, FetchError>> + Send + 'static,
    {
        if let Some(entry) = self.fresh(key) {
            self.inner.hits.fetch_add(1, Ordering::Relaxed);
            debug!(%key, "Entity cache hit");
            return Ok(Lookup {
                entry,
                refreshed: false,
                stale: false,
            });
        }

        let flight = match self.inner.in_flight.entry(key.clone()) {
            Entry::Occupied(pending) => {
                debug!(%key, "Joining in-flight fetch");
                pending.get().clone()
            }
            Entry::Vacant(slot) => {
                // A fetch may have landed between the first lookup and taking the slot.
                if let Some(entry) = self.fresh(key) {
                    self.inner.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Lookup {
                        entry,
                        refreshed: false,
                        stale: false,
                    });
                }
                debug!(%key, "Entity cache miss");
                let flight = self.launch(key.clone(), ttl, fetch());
                slot.insert(flight.clone());
                flight
            }
        };
        self.inner.misses.fetch_add(1, Ordering::Relaxed);

        match flight.await {
            Ok(entry) => Ok(Lookup {
                entry,
                refreshed: true,
                stale: false,
            }),
            Err(e) => {
                let Some(entry) = self.get(key) else {
                    return Err(e);
                };
                let stale = self.is_stale(&entry);
                if stale {
                    self.inner.stale_served.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        %key,
                        error = %e,
                        age_seconds = entry.age(self.now()).num_seconds(),
                        "Serving stale entry after failed fetch"
                    );
                }
                Ok(Lookup {
                    entry,
                    refreshed: false,
                    stale,
                })
            }
        }
    }

    /// Fetch `key` regardless of freshness.
    ///
    /// A failure is returned as-is and the existing entry stays in place.
    /// If a fetch for the key is already in flight, this waits for it to
    /// finish and then issues its own. `fetch` is held to the same rule as
    /// in [`get_or_populate`](Self::get_or_populate).
    pub async fn force_refresh<T, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<Arc<CacheEntry>, FetchError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, FetchError>> + Send + 'static,
    {
        let flight = {
            let slot = loop {
                let pending = match self.inner.in_flight.entry(key.clone()) {
                    Entry::Occupied(pending) => pending.get().clone(),
                    Entry::Vacant(slot) => break slot,
                };
                debug!(%key, "Refresh waiting for in-flight fetch");
                let _ = pending.await;
            };

            info!(%key, "Forced refresh");
            let flight = self.launch(key.clone(), ttl, fetch());
            slot.insert(flight.clone());
            flight
        };
        flight.await
    }

    /// Spawn the fetch task and wrap it as a shareable future.
    fn launch<T, Fut>(&self, key: CacheKey, ttl: Duration, fetch: Fut) -> Flight
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, FetchError>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let guard = FlightGuard {
                inner: Arc::clone(&inner),
                key: key.clone(),
            };

            let result = match tokio::time::timeout(inner.fetch_timeout, fetch).await {
                Ok(Ok(items)) => {
                    let entry = Arc::new(CacheEntry::new(key.clone(), items, inner.clock.now(), ttl));
                    inner.entries.insert(key.clone(), Arc::clone(&entry));
                    info!(%key, size = entry.size(), "Entity cache populated");
                    Ok(entry)
                }
                Ok(Err(e)) => {
                    warn!(%key, error = %e, "Upstream fetch failed");
                    Err(e)
                }
                Err(_) => {
                    warn!(%key, timeout = ?inner.fetch_timeout, "Upstream fetch timed out");
                    Err(FetchError::Timeout)
                }
            };

            drop(guard);
            result
        });

        async move {
            handle
                .await
                .unwrap_or_else(|e| Err(FetchError::Unreachable(format!("fetch task failed: {}", e))))
        }
        .boxed()
        .shared()
    }

    /// Remove the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = self.inner.entries.remove(key).is_some();
        if removed {
            debug!(%key, "Invalidated entity cache entry");
        }
        removed
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        let count = self.inner.entries.len();
        self.inner.entries.clear();
        info!(count, "Entity cache cleared");
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Number of keys with a fetch currently outstanding.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Entry ages and sizes plus the process-wide counters.
    pub fn stats(&self) -> CacheStats {
        self.collect_stats(|_| true)
    }

    /// Like [`stats`](Self::stats), restricted to one family's entries.
    pub fn stats_for(&self, family: Family) -> CacheStats {
        self.collect_stats(|key| key.family == family)
    }

    fn collect_stats(&self, include: impl Fn(&CacheKey) -> bool) -> CacheStats {
        let now = self.now();
        let mut entries: Vec<EntryStats> = self
            .inner
            .entries
            .iter()
            .filter(|item| include(item.key()))
            .map(|item| {
                let entry = item.value();
                EntryStats {
                    key: entry.key().to_string(),
                    family: entry.key().family,
                    age_seconds: entry.age(now).num_seconds(),
                    size: entry.size(),
                    fetched_at: entry.fetched_at(),
                    stale: entry.is_stale(now),
                }
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStats {
            entries,
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            stale_served: self.inner.stale_served.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache")
            .field("entries", &self.inner.entries.len())
            .field("in_flight", &self.inner.in_flight.len())
            .field("fetch_timeout", &self.inner.fetch_timeout)
            .finish()
    }
}
