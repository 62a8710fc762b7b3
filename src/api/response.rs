//! Success envelope shared by all handlers.

use std::sync::Arc;

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::families::Snapshot;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub count: usize,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Present only on data served from the entity cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_stale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T: Serialize> ApiResponse<T> {
    /// One record.
    pub fn one(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            count: 1,
            data,
            message: None,
            is_stale: None,
            fetched_at: None,
        })
    }

    /// One record picked out of a cached collection.
    pub fn cached(snapshot: Snapshot<T>) -> Json<Self> {
        Json(Self {
            success: true,
            count: 1,
            data: snapshot.data,
            message: None,
            is_stale: Some(snapshot.stale),
            fetched_at: Some(snapshot.fetched_at),
        })
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Json<Self> {
        Json(Self {
            success: true,
            count: data.len(),
            data,
            message: None,
            is_stale: None,
            fetched_at: None,
        })
    }
}

impl<T: Serialize> ApiResponse<Arc<Vec<T>>> {
    /// A cached collection with its freshness.
    pub fn snapshot(snapshot: Snapshot<Arc<Vec<T>>>) -> Json<Self> {
        Json(Self {
            success: true,
            count: snapshot.data.len(),
            data: snapshot.data,
            message: None,
            is_stale: Some(snapshot.stale),
            fetched_at: Some(snapshot.fetched_at),
        })
    }

    pub fn shared(data: Arc<Vec<T>>) -> Json<Self> {
        Json(Self {
            success: true,
            count: data.len(),
            data,
            message: None,
            is_stale: None,
            fetched_at: None,
        })
    }
}

/// Attach a message to a response.
pub fn with_message<T: Serialize>(mut response: Json<ApiResponse<T>>, message: impl Into<String>) -> Json<ApiResponse<T>> {
    response.0.message = Some(message.into());
    response
}
