//! Request DTOs.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::Validate;

use warden_entity::license::{CreateLicense, KillMethod, LicensePatch, LicenseType};
use warden_entity::verification::CheckKind;

/// Body of `POST /api/license/create`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLicenseRequest {
    /// Binary the license attaches to.
    pub binary_id: Uuid,
    /// Mutability class, fixed forever.
    pub license_type: LicenseType,
    /// Single startup check vs periodic, fixed forever.
    pub sync_mode: bool,
    /// Offline tolerance in seconds, fixed forever (None = unlimited).
    pub grace_period: Option<i64>,
    /// Client-side offline kill threshold, fixed forever.
    #[validate(range(min = 1))]
    pub network_failure_kill_count: i32,
    /// Interval between periodic checks.
    #[validate(range(min = 1))]
    pub check_interval_ms: i64,
    /// Enforcement action on KILL.
    pub kill_method: KillMethod,
    /// Execution budget (None = unlimited).
    #[validate(range(min = 1))]
    pub max_executions: Option<i64>,
    /// Expiry relative to creation time (None = never).
    #[validate(range(min = 1))]
    pub expires_in_seconds: Option<i64>,
}

impl From<CreateLicenseRequest> for CreateLicense {
    fn from(req: CreateLicenseRequest) -> Self {
        CreateLicense {
            binary_id: req.binary_id,
            license_type: req.license_type,
            sync_mode: req.sync_mode,
            grace_period_seconds: req.grace_period,
            network_failure_kill_count: req.network_failure_kill_count,
            check_interval_ms: req.check_interval_ms,
            kill_method: req.kill_method,
            max_executions: req.max_executions,
            expires_in_seconds: req.expires_in_seconds,
        }
    }
}

/// Body of `PATCH /api/license/{id}`.
///
/// An absent field is untouched; an explicit `null` clears the nullable
/// fields, which is why the nullable ones deserialize into
/// `Option<Option<_>>`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchLicenseRequest {
    /// New check interval.
    pub check_interval_ms: Option<i64>,
    /// New kill method.
    pub kill_method: Option<KillMethod>,
    /// New execution budget, or null to remove the cap.
    #[serde(default, deserialize_with = "double_option")]
    pub max_executions: Option<Option<i64>>,
    /// New expiry relative to patch time, or null to clear it.
    #[serde(default, deserialize_with = "double_option")]
    pub expires_in_seconds: Option<Option<i64>>,
}

impl From<PatchLicenseRequest> for LicensePatch {
    fn from(req: PatchLicenseRequest) -> Self {
        LicensePatch {
            check_interval_ms: req.check_interval_ms,
            kill_method: req.kill_method,
            max_executions: req.max_executions,
            expires_in_seconds: req.expires_in_seconds,
        }
    }
}

/// Body of `POST /api/verify` — the machine-facing check.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    /// License the caller claims to hold.
    pub license_id: Uuid,
    /// Stable identifier of the calling installation.
    pub machine_fingerprint: String,
    /// New execution vs heartbeat; defaults to a start.
    #[serde(default)]
    pub kind: CheckKind,
}

/// Distinguishes a present-but-null JSON field from an absent one.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_absent_vs_null() {
        let absent: PatchLicenseRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(absent.max_executions, None);

        let null: PatchLicenseRequest =
            serde_json::from_str(r#"{"max_executions": null}"#).unwrap();
        assert_eq!(null.max_executions, Some(None));

        let set: PatchLicenseRequest =
            serde_json::from_str(r#"{"max_executions": 10}"#).unwrap();
        assert_eq!(set.max_executions, Some(Some(10)));
    }

    #[test]
    fn test_verify_defaults_to_start() {
        let req: VerifyRequest = serde_json::from_str(
            r#"{"license_id":"550e8400-e29b-41d4-a716-446655440000","machine_fingerprint":"abcdef0123456789"}"#,
        )
        .unwrap();
        assert_eq!(req.kind, CheckKind::Start);
    }
}
