//! Per-family orchestration of upstream client, normalizer and entity cache.
//!
//! `FamilyCache<T>` holds the shared logic; each family module adds its
//! entity shape, its upstream endpoint and its family-specific operations:
//!
//! - `company` - HR/ERP companies, optionally scoped by user profile
//! - `driver` - driver roster, optionally scoped by transport company
//! - `location` - location registry, global only

pub mod company;
pub mod driver;
pub mod location;

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, CacheStats, EntityCache, Scope};
use crate::upstream::normalize::normalize_batch;
use crate::upstream::{Entity, FetchError, Source};

pub use company::{Company, CompanyDirectory};
pub use driver::{Driver, DriverRoster};
pub use location::{Location, LocationRegistry};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Cached payload for {key} is not {expected} (holds {found})")]
    PayloadType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Data served from the cache, with its freshness.
#[derive(Debug, Clone)]
pub struct Snapshot<D> {
    pub data: D,
    pub fetched_at: DateTime<Utc>,
    /// Past its TTL and served because the refresh attempt failed.
    pub stale: bool,
}

impl<D> Snapshot<D> {
    pub fn map<E>(self, f: impl FnOnce(D) -> E) -> Snapshot<E> {
        Snapshot {
            data: f(self.data),
            fetched_at: self.fetched_at,
            stale: self.stale,
        }
    }
}

impl<D> Snapshot<Option<D>> {
    /// `None` if the lookup found nothing.
    pub fn transpose(self) -> Option<Snapshot<D>> {
        let Snapshot { data, fetched_at, stale } = self;
        data.map(|data| Snapshot { data, fetched_at, stale })
    }
}

/// Typed view of an entry's payload.
fn snapshot<T: Entity>(entry: &CacheEntry, stale: bool) -> Result<Snapshot<Arc<Vec<T>>>, CacheError> {
    let items = entry.items::<T>().ok_or_else(|| CacheError::PayloadType {
        key: entry.key().to_string(),
        expected: std::any::type_name::<T>(),
        found: entry.payload_type(),
    })?;
    Ok(Snapshot {
        data: items,
        fetched_at: entry.fetched_at(),
        stale,
    })
}

/// Upstream fetch followed by normalization, as a detachable future.
fn fetcher<T: Entity>(
    source: Arc<dyn Source>,
    scope: Scope,
) -> impl FnOnce() -> BoxFuture<'static, Result<Vec<T>, FetchError>> {
    move || {
        let fetch = source.fetch(&scope);
        async move { Ok(normalize_batch::<T>(fetch.await?)) }.boxed()
    }
}

/// Cache orchestrator for one entity family.
pub struct FamilyCache<T: Entity> {
    cache: EntityCache,
    source: Arc<dyn Source>,
    ttl: Duration,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for FamilyCache<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            source: Arc::clone(&self.source),
            ttl: self.ttl,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> FamilyCache<T> {
    pub fn new(cache: EntityCache, source: Arc<dyn Source>, ttl: Duration) -> Self {
        Self {
            cache,
            source,
            ttl,
            _entity: PhantomData,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(scope: Scope) -> CacheKey {
        CacheKey::new(T::FAMILY, scope)
    }

    fn fetcher(&self, scope: Scope) -> impl FnOnce() -> BoxFuture<'static, Result<Vec<T>, FetchError>> {
        fetcher::<T>(Arc::clone(&self.source), scope)
    }

    async fn lookup(&self, scope: Scope) -> Result<Snapshot<Arc<Vec<T>>>, CacheError> {
        let key = Self::key(scope.clone());
        let lookup = self
            .cache
            .get_or_populate(&key, self.ttl, self.fetcher(scope))
            .await?;
        if lookup.refreshed {
            debug!("Populated {} with {} records", key, lookup.entry.size());
        }
        snapshot(&lookup.entry, lookup.stale)
    }

    /// The whole collection, in upstream order.
    pub async fn list_all(&self) -> Result<Snapshot<Arc<Vec<T>>>, CacheError> {
        self.lookup(Scope::All).await
    }

    /// One entity, picked out of the global collection. There is no
    /// per-id cache entry.
    pub async fn get_by_key(&self, id: &str) -> Result<Snapshot<Option<T>>, CacheError> {
        let all = self.list_all().await?;
        Ok(all.map(|items| items.iter().find(|e| e.matches_key(id)).cloned()))
    }

    /// The slice of the collection owned by `scope_id`, cached under its own
    /// key with its own freshness.
    pub async fn get_by_scope(&self, scope_id: &str) -> Result<Snapshot<Arc<Vec<T>>>, CacheError> {
        self.lookup(Scope::from_option(Some(scope_id))).await
    }

    /// Refetch a scope (global if `None`). Failures are reported, never
    /// answered from the old entry.
    pub async fn refresh(&self, scope: Option<&str>) -> Result<Snapshot<Arc<Vec<T>>>, CacheError> {
        let scope = Scope::from_option(scope);
        let key = Self::key(scope.clone());
        let entry = self
            .cache
            .force_refresh(&key, self.ttl, self.fetcher(scope))
            .await?;
        snapshot(&entry, false)
    }

    /// Drop a scope's entry (global if `None`).
    pub fn invalidate(&self, scope: Option<&str>) -> bool {
        self.cache.invalidate(&Self::key(Scope::from_option(scope)))
    }

    /// Stats restricted to this family's entries.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats_for(T::FAMILY)
    }
}
