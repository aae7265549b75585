//! License management handlers (dashboard surface).

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;
use validator::Validate;

use warden_core::AppError;
use warden_core::types::pagination::PageResponse;
use warden_service::license::LicenseStats;

use crate::dto::request::{CreateLicenseRequest, PatchLicenseRequest};
use crate::dto::response::{ApiResponse, DeletedResponse, LicenseResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthOperator, ListQuery};
use crate::state::AppState;

/// POST /api/license/create
pub async fn create_license(
    State(state): State<AppState>,
    auth: AuthOperator,
    Json(req): Json<CreateLicenseRequest>,
) -> ApiResult<Json<ApiResponse<LicenseResponse>>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let license = state.license_service.create(&auth, req.into()).await?;
    Ok(Json(ApiResponse::ok(LicenseResponse::from_license(license))))
}

/// GET /api/license/{id}
pub async fn get_license(
    State(state): State<AppState>,
    auth: AuthOperator,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<LicenseResponse>>> {
    let license = state.license_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(LicenseResponse::from_license(license))))
}

/// PATCH /api/license/{id}
pub async fn patch_license(
    State(state): State<AppState>,
    auth: AuthOperator,
    Path(id): Path<Uuid>,
    Json(req): Json<PatchLicenseRequest>,
) -> ApiResult<Json<ApiResponse<LicenseResponse>>> {
    let license = state.license_service.patch(&auth, id, req.into()).await?;
    Ok(Json(ApiResponse::ok(LicenseResponse::from_license(license))))
}

/// POST /api/license/{id}/revoke
pub async fn revoke_license(
    State(state): State<AppState>,
    auth: AuthOperator,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<LicenseResponse>>> {
    let license = state.license_service.revoke(&auth, id).await?;
    Ok(Json(ApiResponse::ok(LicenseResponse::from_license(license))))
}

/// POST /api/license/{id}/re-enable
pub async fn re_enable_license(
    State(state): State<AppState>,
    auth: AuthOperator,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<LicenseResponse>>> {
    let license = state.license_service.re_enable(&auth, id).await?;
    Ok(Json(ApiResponse::ok(LicenseResponse::from_license(license))))
}

/// DELETE /api/license/{id}
pub async fn delete_license(
    State(state): State<AppState>,
    auth: AuthOperator,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<DeletedResponse>>> {
    state.license_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(DeletedResponse { id, deleted: true })))
}

/// GET /api/license/{id}/stats
pub async fn license_stats(
    State(state): State<AppState>,
    auth: AuthOperator,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<LicenseStats>>> {
    let stats = state.license_service.stats(&auth, id).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// GET /api/licenses
pub async fn list_licenses(
    State(state): State<AppState>,
    auth: AuthOperator,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<PageResponse<LicenseResponse>>>> {
    let (page, sort_by, order) = query.resolve()?;
    let licenses = state
        .license_service
        .list(&auth, &page, sort_by, order)
        .await?;
    Ok(Json(ApiResponse::ok(
        licenses.map(LicenseResponse::from_license),
    )))
}

/// GET /api/binary/{id}/licenses
pub async fn list_binary_licenses(
    State(state): State<AppState>,
    auth: AuthOperator,
    Path(binary_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<LicenseResponse>>>> {
    let licenses = state
        .license_service
        .list_for_binary(&auth, binary_id)
        .await?;
    Ok(Json(ApiResponse::ok(
        licenses
            .into_iter()
            .map(LicenseResponse::from_license)
            .collect(),
    )))
}
