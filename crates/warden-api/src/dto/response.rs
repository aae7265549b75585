//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_entity::license::{License, LicenseState};
use warden_entity::verification::VerificationAttempt;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// License row with its computed lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseResponse {
    /// The license row.
    #[serde(flatten)]
    pub license: License,
    /// Computed state at response time.
    pub state: LicenseState,
}

impl LicenseResponse {
    /// Build from a license row, computing the state now.
    pub fn from_license(license: License) -> Self {
        let state = license.state(Utc::now());
        Self { license, state }
    }
}

/// One-time download token issue response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadTokenResponse {
    /// Token to present on the download URL.
    pub token: String,
    /// When the token stops being redeemable.
    pub expires_at: DateTime<Utc>,
    /// Relative URL to redeem the token at.
    pub download_url: String,
}

/// Paginated attempt log slice for a binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptPageResponse {
    /// Attempts in this slice, newest first.
    pub items: Vec<VerificationAttempt>,
    /// Total attempts for the binary.
    pub total: u64,
    /// Requested limit.
    pub limit: i64,
    /// Requested skip.
    pub skip: i64,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime.
    pub uptime_seconds: i64,
}

/// Detailed health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// Store status.
    pub database: String,
    /// Version.
    pub version: String,
    /// Uptime.
    pub uptime_seconds: i64,
}

/// Deleted-resource acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedResponse {
    /// The deleted resource's id.
    pub id: Uuid,
    /// Always true on success.
    pub deleted: bool,
}
