//! Container CRUD over the local store.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::api::response::{ApiResponse, with_message};
use crate::database::models::container::normalize_container_no;
use crate::database::models::{Container, ContainerFilter, ContainerInput};

fn container_no(raw: &str) -> ApiResult<String> {
    normalize_container_no(raw).map_err(ApiError::bad_request)
}

/// GET /api/containers?depot=&status=&shippingLine=
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ContainerFilter>,
) -> ApiResult<Json<ApiResponse<Vec<Container>>>> {
    let containers = state.containers.list(&filter).await?;
    Ok(ApiResponse::list(containers))
}

/// GET /api/containers/:container_no
pub async fn get(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<ApiResponse<Container>>> {
    let number = container_no(&raw)?;
    match state.containers.get(&number).await? {
        Some(container) => Ok(ApiResponse::one(container)),
        None => Err(ApiError::not_found(format!("Container {} not found", number))),
    }
}

/// POST /api/containers
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ContainerInput>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Container>>)> {
    let Some(raw) = input.container_no.clone() else {
        return Err(ApiError::bad_request("containerNo is required"));
    };
    let container = input.into_container(&raw).map_err(ApiError::bad_request)?;

    if !state.containers.create(&container).await? {
        return Err(ApiError::conflict(format!(
            "Container {} already exists",
            container.container_no
        )));
    }

    let message = format!("Container {} created", container.container_no);
    Ok((
        StatusCode::CREATED,
        with_message(ApiResponse::one(container), message),
    ))
}

/// PUT /api/containers/:container_no
pub async fn replace(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(input): Json<ContainerInput>,
) -> ApiResult<Json<ApiResponse<Container>>> {
    let number = container_no(&raw)?;
    if let Some(body_no) = input.container_no.as_deref()
        && container_no(body_no)? != number
    {
        return Err(ApiError::bad_request(format!(
            "containerNo in body does not match {}",
            number
        )));
    }

    let container = input.into_container(&number).map_err(ApiError::bad_request)?;
    state.containers.save(&container).await?;
    Ok(with_message(
        ApiResponse::one(container),
        format!("Container {} saved", number),
    ))
}

/// DELETE /api/containers/:container_no
pub async fn delete(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let number = container_no(&raw)?;
    if !state.containers.delete(&number).await? {
        return Err(ApiError::not_found(format!("Container {} not found", number)));
    }
    let message = format!("Container {} deleted", number);
    Ok(with_message(ApiResponse::one(number), message))
}
