use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tracing::warn;

use crate::api::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub database: &'static str,
    pub cache_entries: usize,
}

/// GET /health - liveness; a failed database ping is reported, not fatal.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let database = match state.db.ping().await {
        Ok(()) => "up",
        Err(e) => {
            warn!("Health check: database ping failed: {:#}", e);
            "down"
        }
    };

    Json(Health {
        status: "ok",
        database,
        cache_entries: state.entities.len(),
    })
}
