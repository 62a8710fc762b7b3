//! Family-specific upstream endpoints.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use super::{FetchError, UpstreamClient};
use crate::cache::Scope;

/// Placeholder for the owner id in a scoped path template.
pub const SCOPE_SEGMENT: &str = "{scope}";

/// Something that can fetch a family's raw records for a scope.
///
/// The returned future owns everything it needs, so the cache can run it
/// as a detached task.
pub trait Source: Send + Sync + 'static {
    fn fetch(&self, scope: &Scope) -> BoxFuture<'static, Result<Vec<Value>, FetchError>>;
}

/// A collection endpoint on one upstream system, with an optional
/// owner-scoped variant.
#[derive(Clone)]
pub struct Endpoint {
    client: UpstreamClient,
    all: &'static [&'static str],
    scoped: Option<&'static [&'static str]>,
}

impl Endpoint {
    pub fn new(
        client: UpstreamClient,
        all: &'static [&'static str],
        scoped: Option<&'static [&'static str]>,
    ) -> Self {
        Self { client, all, scoped }
    }

    /// Resolve the path segments for `scope`.
    pub fn segments(&self, scope: &Scope) -> Result<Vec<String>, FetchError> {
        match scope {
            Scope::All => Ok(self.all.iter().map(|s| s.to_string()).collect()),
            Scope::Owner(id) => {
                let template = self.scoped.ok_or(FetchError::Unsupported(self.client.name()))?;
                Ok(template
                    .iter()
                    .map(|s| if *s == SCOPE_SEGMENT { id.clone() } else { s.to_string() })
                    .collect())
            }
        }
    }
}

impl Source for Endpoint {
    fn fetch(&self, scope: &Scope) -> BoxFuture<'static, Result<Vec<Value>, FetchError>> {
        let client = self.client.clone();
        let segments = self.segments(scope);
        async move { client.fetch_collection(&segments?).await }.boxed()
    }
}
