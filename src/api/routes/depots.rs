//! Depot CRUD over the local store.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::api::response::{ApiResponse, with_message};
use crate::database::models::{Depot, DepotInput};

fn depot_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Arc<Vec<Depot>>>>> {
    let depots = state.depots.list().await?;
    Ok(ApiResponse::shared(depots))
}

pub async fn get(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<ApiResponse<Depot>>> {
    let code = depot_code(&code);
    match state.depots.get(&code).await? {
        Some(depot) => Ok(ApiResponse::one(depot)),
        None => Err(ApiError::not_found(format!("Depot {} not found", code))),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<DepotInput>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Depot>>)> {
    let Some(code) = input.code.clone() else {
        return Err(ApiError::bad_request("code is required"));
    };
    let depot = input.into_depot(&code).map_err(ApiError::bad_request)?;

    if !state.depots.create(&depot).await? {
        return Err(ApiError::conflict(format!("Depot {} already exists", depot.code)));
    }

    let message = format!("Depot {} created", depot.code);
    Ok((StatusCode::CREATED, with_message(ApiResponse::one(depot), message)))
}

pub async fn replace(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(input): Json<DepotInput>,
) -> ApiResult<Json<ApiResponse<Depot>>> {
    let code = depot_code(&code);
    if let Some(body_code) = input.code.as_deref()
        && depot_code(body_code) != code
    {
        return Err(ApiError::bad_request(format!("code in body does not match {}", code)));
    }

    let depot = input.into_depot(&code).map_err(ApiError::bad_request)?;
    state.depots.save(&depot).await?;
    Ok(with_message(ApiResponse::one(depot), format!("Depot {} saved", code)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let code = depot_code(&code);
    if !state.depots.delete(&code).await? {
        return Err(ApiError::not_found(format!("Depot {} not found", code)));
    }
    let message = format!("Depot {} deleted", code);
    Ok(with_message(ApiResponse::one(code), message))
}
