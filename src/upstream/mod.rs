//! Upstream access: HTTP client, per-family endpoints and record
//! normalization.
//!
//! Upstream systems (HR/ERP user profiles, driver management, location
//! registry) are treated as opaque JSON collection endpoints. A fetch is a
//! single attempt; there is no caching and no retrying at this layer.

mod client;
mod error;
pub mod normalize;
mod source;

pub use client::UpstreamClient;
pub use error::{ErrorKind, FetchError};
pub use normalize::{Entity, NormalizeError, RawRecord};
pub use source::{Endpoint, Source, SCOPE_SEGMENT};
