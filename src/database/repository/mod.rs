//! Repository module - data access for locally stored records.

mod container_repository;
mod depot_repository;
mod lookup_repository;

use anyhow::Result;
use mongodb::bson::{Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};

pub use container_repository::ContainerRepository;
pub use depot_repository::DepotRepository;
pub use lookup_repository::LookupRepository;

/// MongoDB duplicate key error code.
const DUPLICATE_KEY: i32 = 11000;

/// Whether an insert failed because the key already exists.
pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// Create a unique ascending index on `field` (no-op if it exists).
pub(crate) async fn ensure_unique_index<T: Send + Sync>(collection: &Collection<T>, field: &str) -> Result<()> {
    let keys: Document = doc! { field: 1 };
    let index = IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build();
    collection.create_index(index).await?;
    Ok(())
}
