//! Shipping lines and order statuses.

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRef, Path, State};

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::api::response::ApiResponse;
use crate::database::LookupRepository;
use crate::database::models::LookupRecord;

pub async fn list<T: LookupRecord>(
    State(repo): State<Arc<LookupRepository<T>>>,
) -> ApiResult<Json<ApiResponse<Arc<Vec<T>>>>>
where
    Arc<LookupRepository<T>>: FromRef<AppState>,
{
    Ok(ApiResponse::shared(repo.list().await?))
}

pub async fn get<T: LookupRecord>(
    State(repo): State<Arc<LookupRepository<T>>>,
    Path(code): Path<String>,
) -> ApiResult<Json<ApiResponse<T>>>
where
    Arc<LookupRepository<T>>: FromRef<AppState>,
{
    match repo.get(&code).await? {
        Some(record) => Ok(ApiResponse::one(record)),
        None => Err(ApiError::not_found(format!(
            "No '{}' in {}",
            code.trim(),
            T::COLLECTION
        ))),
    }
}
