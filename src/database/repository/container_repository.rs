//! Container repository with per-record caching.

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::doc;
use tracing::debug;

use super::{ensure_unique_index, is_duplicate_key};
use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::Database;
use crate::database::models::{Container, ContainerFilter};

/// Repository for container records, keyed by container number.
pub struct ContainerRepository {
    collection: Collection<Container>,
    cache: TypedCache<String, Container>,
}

impl ContainerRepository {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Result<Self> {
        let containers_cache = cache.get_or_create("containers", CacheConfig::records())?;

        Ok(Self {
            collection: db.collection("containers"),
            cache: containers_cache,
        })
    }

    /// Make container numbers unique at the database level.
    pub async fn ensure_indexes(&self) -> Result<()> {
        ensure_unique_index(&self.collection, "containerNo").await
    }

    /// List containers matching `filter`, ordered by container number.
    /// Listings bypass the cache.
    pub async fn list(&self, filter: &ContainerFilter) -> Result<Vec<Container>> {
        let cursor = self
            .collection
            .find(filter.to_document())
            .sort(doc! { "containerNo": 1 })
            .await?;
        let containers: Vec<Container> = cursor.try_collect().await?;
        debug!("Listed {} containers for {:?}", containers.len(), filter);
        Ok(containers)
    }

    /// Get a container by number, cache first.
    pub async fn get(&self, container_no: &str) -> Result<Option<Container>> {
        let key = container_no.to_string();
        if let Some(container) = self.cache.get(&key) {
            return Ok(Some(container));
        }

        let result = self
            .collection
            .find_one(doc! { "containerNo": container_no })
            .await?;

        if let Some(container) = &result {
            self.cache.insert(key, container.clone());
        }
        Ok(result)
    }

    /// Insert a new container. Returns `false` if the number is taken.
    pub async fn create(&self, container: &Container) -> Result<bool> {
        match self.collection.insert_one(container).await {
            Ok(_) => {
                self.cache.insert(container.container_no.clone(), container.clone());
                debug!("Created container {}", container.container_no);
                Ok(true)
            }
            Err(e) if is_duplicate_key(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Save a container (upsert).
    pub async fn save(&self, container: &Container) -> Result<()> {
        let filter = doc! { "containerNo": &container.container_no };
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(filter, container)
            .with_options(options)
            .await?;

        self.cache.insert(container.container_no.clone(), container.clone());
        debug!("Saved container {}", container.container_no);
        Ok(())
    }

    /// Delete a container. Returns whether it existed.
    pub async fn delete(&self, container_no: &str) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "containerNo": container_no })
            .await?;

        self.cache.invalidate(&container_no.to_string());
        debug!("Deleted container {}: {}", container_no, result.deleted_count > 0);
        Ok(result.deleted_count > 0)
    }
}
