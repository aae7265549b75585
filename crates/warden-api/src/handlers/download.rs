//! One-time token download handler (machine/browser facing).

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::Response;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use warden_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// `?token=` query string.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadQuery {
    /// The one-time token issued by the dashboard.
    pub token: String,
}

/// GET /download/{id}?token=...
///
/// The single-use token is the entire credential; no bearer auth. The
/// artifact is streamed, never buffered.
pub async fn download_binary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let (binary, file) = state.binary_service.redeem_download(id, &query.token).await?;

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, binary.wrapped_size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", binary.name),
        )
        .body(body)
        .map_err(|e| AppError::internal(format!("Failed to build download response: {e}")).into())
}
