//! Cache inspection and invalidation.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::families::ScopeQuery;
use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::api::response::{ApiResponse, with_message};
use crate::cache::{CacheKey, CacheStats, Family, RecordCacheStats, Scope};

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub family: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    #[serde(flatten)]
    pub entity: CacheStats,
    pub hit_rate: f64,
    pub in_flight: usize,
    /// Moka-backed caches of the local repositories; omitted for a
    /// single-family query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<RecordCacheStats>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClearQuery {
    /// Also drop the record caches of the local repositories.
    #[serde(default)]
    pub records: bool,
}

#[derive(Debug, Serialize)]
pub struct Invalidated {
    pub key: String,
    pub removed: bool,
}

fn parse_family(raw: &str) -> ApiResult<Family> {
    Family::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = Family::ALL.iter().map(|f| f.as_str()).collect();
        ApiError::bad_request(format!(
            "Unknown cache family '{}' (expected one of: {})",
            raw.trim(),
            known.join(", ")
        ))
    })
}

/// GET /api/cache/stats?family=
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<ApiResponse<StatsView>>> {
    let family = query
        .family
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .map(parse_family)
        .transpose()?;

    let (entity, records) = match family {
        Some(Family::Company) => (state.companies.stats(), None),
        Some(Family::Driver) => (state.drivers.stats(), None),
        Some(Family::Location) => (state.locations.stats(), None),
        None => (state.entities.stats(), Some(state.registry.stats())),
    };

    let view = StatsView {
        hit_rate: entity.hit_rate(),
        in_flight: state.entities.in_flight(),
        entity,
        records,
    };
    let mut response = ApiResponse::one(view);
    response.0.count = response.0.data.entity.entries.len();
    Ok(response)
}

/// DELETE /api/cache?records=
pub async fn clear(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> ApiResult<Json<ApiResponse<usize>>> {
    let removed = state.entities.len();
    state.entities.clear();
    info!("Entity cache cleared ({} entries)", removed);

    let mut message = format!("Cleared {} cache entries", removed);
    if query.records {
        state.registry.clear_all();
        message.push_str(" and all record caches");
    }
    Ok(with_message(ApiResponse::one(removed), message))
}

/// DELETE /api/cache/:family?scope=
pub async fn invalidate(
    State(state): State<AppState>,
    Path(family): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> ApiResult<Json<ApiResponse<Invalidated>>> {
    let family = parse_family(&family)?;
    let scope = query.scope.as_deref();

    let removed = match family {
        Family::Company => state.companies.invalidate(scope),
        Family::Driver => state.drivers.invalidate(scope),
        Family::Location => state.locations.invalidate(scope),
    };

    let key = CacheKey::new(family, Scope::from_option(scope)).to_string();
    let message = if removed {
        format!("Invalidated {}", key)
    } else {
        format!("No cache entry for {}", key)
    };
    Ok(with_message(
        ApiResponse::one(Invalidated { key, removed }),
        message,
    ))
}
