//! Read and refresh endpoints for the upstream-backed families.
//!
//! The generic handlers are instantiated once per family; the family cache
//! is pulled out of `AppState` through `FromRef`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRef, Path, Query, State};
use serde::Deserialize;
use tracing::info;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::api::response::{ApiResponse, with_message};
use crate::families::{Company, CompanyDirectory, Driver, DriverRoster, FamilyCache};
use crate::upstream::Entity;

type Listing<T> = Json<ApiResponse<Arc<Vec<T>>>>;

#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub scope: Option<String>,
}

/// GET /api/{family}
pub async fn list<T: Entity>(State(family): State<FamilyCache<T>>) -> ApiResult<Listing<T>>
where
    FamilyCache<T>: FromRef<AppState>,
{
    let snapshot = family.list_all().await?;
    Ok(ApiResponse::snapshot(snapshot))
}

/// GET /api/{family}/:id
pub async fn get<T: Entity>(
    State(family): State<FamilyCache<T>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<T>>>
where
    FamilyCache<T>: FromRef<AppState>,
{
    match family.get_by_key(&id).await?.transpose() {
        Some(snapshot) => Ok(ApiResponse::cached(snapshot)),
        None => Err(ApiError::not_found(format!(
            "No record '{}' in {}",
            id.trim(),
            T::FAMILY
        ))),
    }
}

/// POST /api/{family}/refresh?scope=
pub async fn refresh<T: Entity>(
    State(family): State<FamilyCache<T>>,
    Query(query): Query<ScopeQuery>,
) -> ApiResult<Listing<T>>
where
    FamilyCache<T>: FromRef<AppState>,
{
    let snapshot = family.refresh(query.scope.as_deref()).await?;
    let count = snapshot.data.len();
    info!("Refreshed {} ({} records)", T::FAMILY, count);
    Ok(with_message(
        ApiResponse::snapshot(snapshot),
        format!("Refreshed {} {}", count, T::FAMILY),
    ))
}

/// GET /api/users/:profile_id/companies
pub async fn companies_for_user(
    State(companies): State<CompanyDirectory>,
    Path(profile_id): Path<String>,
) -> ApiResult<Listing<Company>> {
    let snapshot = companies.list_for_user(&profile_id).await?;
    Ok(ApiResponse::snapshot(snapshot))
}

/// GET /api/transport-companies/:company_id/drivers
pub async fn drivers_for_company(
    State(drivers): State<DriverRoster>,
    Path(company_id): Path<String>,
) -> ApiResult<Listing<Driver>> {
    let snapshot = drivers.list_for_company(&company_id).await?;
    Ok(ApiResponse::snapshot(snapshot))
}
