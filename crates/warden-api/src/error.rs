//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use warden_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Whether the caller may retry the same request.
    pub retryable: bool,
}

/// Wrapper implementing `IntoResponse` for the shared error type.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_code) = match err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "AUTHENTICATION"),
            ErrorKind::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::Immutable => (StatusCode::UNPROCESSABLE_ENTITY, "IMMUTABLE_LICENSE"),
            ErrorKind::RateLimit => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            ErrorKind::License => (StatusCode::UNPROCESSABLE_ENTITY, "LICENSE_ERROR"),
            ErrorKind::ServiceUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ErrorKind::Database
            | ErrorKind::Storage
            | ErrorKind::Configuration
            | ErrorKind::Serialization
            | ErrorKind::Internal => {
                tracing::error!(error = %err.message, kind = %err.kind, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let retryable = err.is_retryable();
        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message: err.message,
            retryable,
        };

        (status, Json(body)).into_response()
    }
}

/// Handler result alias mapping domain errors to HTTP.
pub type ApiResult<T> = Result<T, ApiError>;
