//! `AuthOperator` extractor — pulls the bearer token from the
//! Authorization header, validates it, and injects the operator context.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use warden_core::error::AppError;
use warden_service::context::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated operator context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthOperator(pub RequestContext);

impl std::ops::Deref for AuthOperator {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthOperator {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Extract Bearer token from Authorization header
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?;

        let claims = state.jwt_decoder.decode(token)?;

        let ip_address = client_ip(&parts.headers);

        Ok(AuthOperator(RequestContext::new(
            claims.sub,
            claims.role,
            ip_address,
        )))
    }
}

/// Caller IP as reported by the reverse proxy.
pub fn client_ip(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
