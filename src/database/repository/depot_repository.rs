//! Depot repository.
//!
//! Depots are few and read on most container operations, so the full
//! listing is cached alongside the per-code cache.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::doc;
use tracing::debug;

use super::{ensure_unique_index, is_duplicate_key};
use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::Database;
use crate::database::models::Depot;

pub struct DepotRepository {
    collection: Collection<Depot>,
    by_code: TypedCache<String, Depot>,
    listing: TypedCache<(), Arc<Vec<Depot>>>,
}

impl DepotRepository {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Result<Self> {
        let by_code = cache.get_or_create("depots", CacheConfig::records())?;
        let listing = cache.get_or_create(
            "depot_listing",
            CacheConfig::lookup().live_for(Duration::from_secs(5 * 60)),
        )?;

        Ok(Self {
            collection: db.collection("depots"),
            by_code,
            listing,
        })
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        ensure_unique_index(&self.collection, "code").await
    }

    /// All depots ordered by code.
    pub async fn list(&self) -> Result<Arc<Vec<Depot>>> {
        if let Some(depots) = self.listing.get(&()) {
            return Ok(depots);
        }

        let cursor = self.collection.find(doc! {}).sort(doc! { "code": 1 }).await?;
        let depots: Arc<Vec<Depot>> = Arc::new(cursor.try_collect().await?);
        self.listing.insert((), Arc::clone(&depots));
        debug!("Loaded {} depots", depots.len());
        Ok(depots)
    }

    pub async fn get(&self, code: &str) -> Result<Option<Depot>> {
        let key = code.to_string();
        if let Some(depot) = self.by_code.get(&key) {
            return Ok(Some(depot));
        }

        let result = self.collection.find_one(doc! { "code": code }).await?;
        if let Some(depot) = &result {
            self.by_code.insert(key, depot.clone());
        }
        Ok(result)
    }

    /// Insert a new depot. Returns `false` if the code is taken.
    pub async fn create(&self, depot: &Depot) -> Result<bool> {
        match self.collection.insert_one(depot).await {
            Ok(_) => {
                self.by_code.insert(depot.code.clone(), depot.clone());
                self.listing.invalidate(&());
                debug!("Created depot {}", depot.code);
                Ok(true)
            }
            Err(e) if is_duplicate_key(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Save a depot (upsert).
    pub async fn save(&self, depot: &Depot) -> Result<()> {
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(doc! { "code": &depot.code }, depot)
            .with_options(options)
            .await?;

        self.by_code.insert(depot.code.clone(), depot.clone());
        self.listing.invalidate(&());
        debug!("Saved depot {}", depot.code);
        Ok(())
    }

    pub async fn delete(&self, code: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "code": code }).await?;

        self.by_code.invalidate(&code.to_string());
        self.listing.invalidate(&());
        debug!("Deleted depot {}: {}", code, result.deleted_count > 0);
        Ok(result.deleted_count > 0)
    }
}
