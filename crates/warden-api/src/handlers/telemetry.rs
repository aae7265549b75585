//! Analytics and dashboard summary handlers.

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use warden_telemetry::{AnalyticsReport, DashboardSummary};

use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::AuthOperator;
use crate::state::AppState;

/// GET /api/analytics
pub async fn analytics(
    State(state): State<AppState>,
    _auth: AuthOperator,
) -> ApiResult<Json<ApiResponse<AnalyticsReport>>> {
    let report = state.telemetry_service.analytics(Utc::now()).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/telemetry/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    _auth: AuthOperator,
) -> ApiResult<Json<ApiResponse<DashboardSummary>>> {
    let summary = state.telemetry_service.dashboard(Utc::now()).await?;
    Ok(Json(ApiResponse::ok(summary)))
}
