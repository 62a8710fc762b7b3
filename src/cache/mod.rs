//! Cache module.
//!
//! Two kinds of cache live here:
//!
//! - `EntityCache` - snapshots of upstream collections (companies, drivers,
//!   locations) keyed by family and scope, with single-flight population,
//!   serve-stale-on-error and explicit refresh.
//! - `TypedCache` / `CacheRegistry` - Moka-backed read caches in front of
//!   the locally stored MongoDB records.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let cache = EntityCache::new(Duration::from_secs(15));
//! let lookup = cache
//!     .get_or_populate(&CacheKey::all(Family::Location), ttl, || fetch_locations())
//!     .await?;
//! ```

mod clock;
mod config;
mod entity;
mod entry;
mod key;
mod registry;
mod stats;
mod typed;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use entity::{EntityCache, Lookup};
pub use entry::CacheEntry;
pub use key::{CacheKey, Family, Scope};
pub use registry::CacheRegistry;
pub use stats::{CacheStats, EntryStats, RecordCacheStats};
pub use typed::TypedCache;
