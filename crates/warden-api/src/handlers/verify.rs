//! The machine-facing verification handler.
//!
//! Deployed binaries authenticate with their license id and machine
//! fingerprint — a capability embedded in the licensed artifact, not an
//! operator session. The human/machine boundary is enforced in both
//! directions: this endpoint rejects any request carrying a bearer
//! token, and operator endpoints never accept license credentials.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

use warden_core::AppError;
use warden_engine::{Verdict, VerificationRequest};

use crate::dto::request::VerifyRequest;
use crate::error::ApiResult;
use crate::extractors::auth::client_ip;
use crate::state::AppState;

/// POST /api/verify
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<Verdict>> {
    if headers.contains_key("authorization") {
        return Err(AppError::authentication(
            "The verification endpoint does not accept operator credentials",
        )
        .into());
    }

    let ip_address = client_ip(&headers);
    state
        .verify_limiter
        .check(ip_address.as_deref().unwrap_or("unknown"))?;

    warden_auth::fingerprint::validate(&req.machine_fingerprint)?;

    let verdict = state
        .engine
        .verify(&VerificationRequest {
            license_id: req.license_id,
            machine_fingerprint: req.machine_fingerprint,
            ip_address,
            kind: req.kind,
        })
        .await?;

    Ok(Json(verdict))
}
