//! Binary management handlers (dashboard surface).

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use warden_core::AppError;
use warden_entity::binary::{Binary, BinarySummary};

use crate::dto::response::{ApiResponse, AttemptPageResponse, DownloadTokenResponse};
use crate::error::ApiResult;
use crate::extractors::AuthOperator;
use crate::state::AppState;

/// Default and maximum page sizes for the attempt log.
const DEFAULT_ATTEMPT_LIMIT: i64 = 50;
const MAX_ATTEMPT_LIMIT: i64 = 500;

/// POST /api/binary/upload (multipart: `file`, optional `original_size`)
pub async fn upload_binary(
    State(state): State<AppState>,
    auth: AuthOperator,
    mut multipart: Multipart,
) -> ApiResult<Json<ApiResponse<Binary>>> {
    let mut name = None;
    let mut data = None;
    let mut original_size = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Malformed multipart body: {e}")))?
    {
        let field_name = field.name().map(String::from);
        match field_name.as_deref() {
            Some("file") => {
                name = field.file_name().map(String::from);
                data = Some(field.bytes().await.map_err(|e| {
                    AppError::validation(format!("Failed to read upload: {e}"))
                })?);
            }
            Some("original_size") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("Malformed field: {e}")))?;
                original_size = Some(text.parse::<i64>().map_err(|_| {
                    AppError::validation("original_size must be an integer")
                })?);
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| AppError::validation("Missing 'file' field"))?;
    let name = name.unwrap_or_else(|| "binary".to_string());
    let original_size = original_size.unwrap_or(data.len() as i64);

    let binary = state
        .binary_service
        .upload(&auth, name, original_size, data)
        .await?;
    Ok(Json(ApiResponse::ok(binary)))
}

/// GET /api/binaries
pub async fn list_binaries(
    State(state): State<AppState>,
    auth: AuthOperator,
) -> ApiResult<Json<ApiResponse<Vec<BinarySummary>>>> {
    let binaries = state.binary_service.list(&auth).await?;
    Ok(Json(ApiResponse::ok(binaries)))
}

/// GET /api/binary/{id}
pub async fn get_binary(
    State(state): State<AppState>,
    auth: AuthOperator,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Binary>>> {
    let binary = state.binary_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(binary)))
}

/// `?limit&skip` query string for the attempt log.
#[derive(Debug, Clone, Deserialize)]
pub struct AttemptQuery {
    /// Maximum rows to return.
    pub limit: Option<i64>,
    /// Rows to skip.
    pub skip: Option<i64>,
}

/// GET /api/binary/{id}/verification-attempts
pub async fn binary_attempts(
    State(state): State<AppState>,
    auth: AuthOperator,
    Path(id): Path<Uuid>,
    Query(query): Query<AttemptQuery>,
) -> ApiResult<Json<ApiResponse<AttemptPageResponse>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ATTEMPT_LIMIT)
        .clamp(1, MAX_ATTEMPT_LIMIT);
    let skip = query.skip.unwrap_or(0).max(0);

    let (items, total) = state.binary_service.attempts(&auth, id, limit, skip).await?;
    Ok(Json(ApiResponse::ok(AttemptPageResponse {
        items,
        total,
        limit,
        skip,
    })))
}

/// POST /api/binary/{id}/download-token
pub async fn issue_download_token(
    State(state): State<AppState>,
    auth: AuthOperator,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<DownloadTokenResponse>>> {
    let token = state.binary_service.issue_download_token(&auth, id).await?;
    Ok(Json(ApiResponse::ok(DownloadTokenResponse {
        download_url: format!("/download/{id}?token={}", token.token),
        token: token.token,
        expires_at: token.expires_at,
    })))
}
