//! Read-only repository for code-keyed reference lists.

use std::sync::Arc;

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::doc;
use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::Database;
use crate::database::models::LookupRecord;
use crate::database::models::lookup::sort_lookup;

/// Repository for one reference list. The list is cached as a whole.
pub struct LookupRepository<T: LookupRecord> {
    collection: Collection<T>,
    cache: TypedCache<(), Arc<Vec<T>>>,
}

impl<T: LookupRecord> LookupRepository<T> {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Result<Self> {
        let list_cache = cache.get_or_create(T::COLLECTION, CacheConfig::lookup())?;

        Ok(Self {
            collection: db.collection(T::COLLECTION),
            cache: list_cache,
        })
    }

    /// The whole list, by sequence then code.
    pub async fn list(&self) -> Result<Arc<Vec<T>>> {
        if let Some(records) = self.cache.get(&()) {
            return Ok(records);
        }

        let cursor = self.collection.find(doc! {}).await?;
        let mut records: Vec<T> = cursor.try_collect().await?;
        sort_lookup(&mut records);

        let records = Arc::new(records);
        self.cache.insert((), Arc::clone(&records));
        debug!("Loaded {} records from {}", records.len(), T::COLLECTION);
        Ok(records)
    }

    /// One record by code (case-insensitive).
    pub async fn get(&self, code: &str) -> Result<Option<T>> {
        let code = code.trim();
        let records = self.list().await?;
        Ok(records.iter().find(|r| r.code().eq_ignore_ascii_case(code)).cloned())
    }
}
