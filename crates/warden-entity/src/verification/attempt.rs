//! Verification attempt log entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One immutable record of a license-check request and its outcome.
///
/// The attempt log is append-only: rows are never updated or deleted in
/// normal operation, and it is the sole input to telemetry aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VerificationAttempt {
    /// Unique attempt identifier.
    pub id: Uuid,
    /// When the request was evaluated.
    pub timestamp: DateTime<Utc>,
    /// License the check was made against.
    pub license_id: Uuid,
    /// Fingerprint of the calling machine.
    pub machine_fingerprint: String,
    /// IP address of the caller.
    pub ip_address: Option<String>,
    /// Whether the verification was allowed.
    pub success: bool,
    /// Rejection reason for failed attempts.
    pub error_message: Option<String>,
    /// False when the machine reappeared after its grace period lapsed.
    pub within_grace_period: bool,
}
