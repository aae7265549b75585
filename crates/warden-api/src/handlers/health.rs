//! Health check handlers (no auth required).

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use crate::dto::response::{DetailedHealthResponse, HealthResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    })
}

/// GET /api/health/detailed
pub async fn detailed_health(
    State(state): State<AppState>,
) -> ApiResult<Json<DetailedHealthResponse>> {
    let database_up = state.store_health.health_check().await.unwrap_or(false);

    Ok(Json(DetailedHealthResponse {
        status: if database_up { "ok" } else { "degraded" }.to_string(),
        database: if database_up { "up" } else { "down" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    }))
}
