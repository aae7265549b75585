//! License entity model and the pure mutation rules over it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use warden_core::{AppError, AppResult};

use super::kill_method::KillMethod;
use super::kind::LicenseType;
use super::state::LicenseState;

/// A license granting a protected binary the right to run.
///
/// The row carries both configuration (fixed or patchable) and runtime
/// counters advanced by the verification engine. `version` is the
/// optimistic-concurrency column: every committed write bumps it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct License {
    /// Unique license identifier.
    pub id: Uuid,
    /// Binary this license belongs to.
    pub binary_id: Uuid,
    /// Mutability class, fixed at creation.
    pub license_type: LicenseType,
    /// True = single startup check; false = periodic checks.
    pub sync_mode: bool,
    /// Client-side offline kill threshold, fixed at creation.
    pub network_failure_kill_count: i32,
    /// Offline tolerance in seconds (None = unlimited), fixed at creation.
    pub grace_period_seconds: Option<i64>,
    /// Interval between periodic checks, handed to the client.
    pub check_interval_ms: i64,
    /// Enforcement action on KILL.
    pub kill_method: KillMethod,
    /// Execution budget (None = unlimited).
    pub max_executions: Option<i64>,
    /// Expiry timestamp (None = never).
    pub expires_at: Option<DateTime<Utc>>,
    /// Executions consumed so far (monotonic).
    pub executions_used: i64,
    /// Consecutive failed verifications, reset on success.
    pub failed_attempts: i32,
    /// Whether an operator has revoked this license.
    pub revoked: bool,
    /// When the license was revoked.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency version.
    pub version: i64,
    /// When the license was created.
    pub created_at: DateTime<Utc>,
    /// When the license was last updated.
    pub updated_at: DateTime<Utc>,
}

impl License {
    /// Compute the lifecycle state at `now`.
    ///
    /// Revoked takes precedence over expired, expired over exhausted.
    pub fn state(&self, now: DateTime<Utc>) -> LicenseState {
        if self.revoked {
            LicenseState::Revoked
        } else if self.is_expired(now) {
            LicenseState::Expired
        } else if self.is_exhausted() {
            LicenseState::Exhausted
        } else {
            LicenseState::Active
        }
    }

    /// Whether the license is past its expiry timestamp.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| now > t)
    }

    /// Whether the execution budget is consumed.
    pub fn is_exhausted(&self) -> bool {
        self.max_executions
            .is_some_and(|max| self.executions_used >= max)
    }

    /// Offline window in seconds a machine may go dark before it is
    /// considered inactive: one check interval plus the grace period.
    /// None means the window is unbounded.
    pub fn offline_window_seconds(&self) -> Option<i64> {
        let grace = self.grace_period_seconds?;
        Some(self.check_interval_ms / 1000 + grace)
    }

    /// Apply a patch, returning the updated row image.
    ///
    /// Read-only licenses reject any patch that carries a mutable field;
    /// the returned error leaves the caller's row untouched. Omitted
    /// fields keep their prior values; explicit nulls clear the nullable
    /// ones. The `version` column is bumped by the store on commit, not
    /// here.
    pub fn apply_patch(&self, patch: &LicensePatch, now: DateTime<Utc>) -> AppResult<License> {
        if patch.is_empty() {
            return Ok(self.clone());
        }
        if self.license_type == LicenseType::Readonly {
            return Err(AppError::immutable(format!(
                "License {} is readonly and cannot be patched",
                self.id
            )));
        }
        patch.validate()?;

        let mut updated = self.clone();
        if let Some(interval) = patch.check_interval_ms {
            updated.check_interval_ms = interval;
        }
        if let Some(method) = patch.kill_method {
            updated.kill_method = method;
        }
        if let Some(max) = patch.max_executions {
            updated.max_executions = max;
        }
        if let Some(expiry) = patch.expires_in_seconds {
            updated.expires_at = expiry.map(|secs| now + Duration::seconds(secs));
        }
        updated.updated_at = now;
        Ok(updated)
    }
}

/// Data required to create a new license.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLicense {
    /// Owning binary.
    pub binary_id: Uuid,
    /// Mutability class.
    pub license_type: LicenseType,
    /// Single startup check vs periodic.
    pub sync_mode: bool,
    /// Offline tolerance in seconds (None = unlimited).
    pub grace_period_seconds: Option<i64>,
    /// Client-side offline kill threshold.
    pub network_failure_kill_count: i32,
    /// Interval between periodic checks.
    pub check_interval_ms: i64,
    /// Enforcement action on KILL.
    pub kill_method: KillMethod,
    /// Execution budget (None = unlimited).
    pub max_executions: Option<i64>,
    /// Expiry relative to creation time (None = never).
    pub expires_in_seconds: Option<i64>,
}

impl CreateLicense {
    /// Validate the creation fields.
    pub fn validate(&self) -> AppResult<()> {
        if self.network_failure_kill_count < 1 {
            return Err(AppError::validation(
                "network_failure_kill_count must be at least 1",
            ));
        }
        if self.check_interval_ms < 1 {
            return Err(AppError::validation("check_interval_ms must be positive"));
        }
        if let Some(grace) = self.grace_period_seconds {
            if grace < 0 {
                return Err(AppError::validation("grace_period cannot be negative"));
            }
        }
        if let Some(max) = self.max_executions {
            if max < 1 {
                return Err(AppError::validation("max_executions must be at least 1"));
            }
        }
        if let Some(secs) = self.expires_in_seconds {
            if secs < 1 {
                return Err(AppError::validation("expires_in_seconds must be positive"));
            }
        }
        Ok(())
    }
}

/// A partial update to the patchable license fields.
///
/// The outer `Option` distinguishes "field absent" from "field present";
/// the inner `Option` on the nullable fields distinguishes a new value
/// from an explicit clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LicensePatch {
    /// New check interval.
    pub check_interval_ms: Option<i64>,
    /// New kill method.
    pub kill_method: Option<KillMethod>,
    /// New execution budget, or `Some(None)` to remove the cap.
    pub max_executions: Option<Option<i64>>,
    /// New expiry relative to patch time, or `Some(None)` to clear it.
    pub expires_in_seconds: Option<Option<i64>>,
}

impl LicensePatch {
    /// Whether the patch carries no mutable field at all.
    pub fn is_empty(&self) -> bool {
        self.check_interval_ms.is_none()
            && self.kill_method.is_none()
            && self.max_executions.is_none()
            && self.expires_in_seconds.is_none()
    }

    /// Validate the submitted values.
    pub fn validate(&self) -> AppResult<()> {
        if let Some(interval) = self.check_interval_ms {
            if interval < 1 {
                return Err(AppError::validation("check_interval_ms must be positive"));
            }
        }
        if let Some(Some(max)) = self.max_executions {
            if max < 1 {
                return Err(AppError::validation("max_executions must be at least 1"));
            }
        }
        if let Some(Some(secs)) = self.expires_in_seconds {
            if secs < 1 {
                return Err(AppError::validation("expires_in_seconds must be positive"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(license_type: LicenseType) -> License {
        let now = Utc::now();
        License {
            id: Uuid::new_v4(),
            binary_id: Uuid::new_v4(),
            license_type,
            sync_mode: false,
            network_failure_kill_count: 5,
            grace_period_seconds: Some(3600),
            check_interval_ms: 60_000,
            kill_method: KillMethod::Stop,
            max_executions: Some(3),
            expires_at: None,
            executions_used: 0,
            failed_attempts: 0,
            revoked: false,
            revoked_at: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_state_precedence() {
        let now = Utc::now();
        let mut license = sample(LicenseType::Patchable);
        license.revoked = true;
        license.expires_at = Some(now - Duration::seconds(10));
        license.executions_used = 3;
        // Revoked wins even when expired and exhausted at the same time.
        assert_eq!(license.state(now), LicenseState::Revoked);

        license.revoked = false;
        assert_eq!(license.state(now), LicenseState::Expired);

        license.expires_at = None;
        assert_eq!(license.state(now), LicenseState::Exhausted);

        license.executions_used = 2;
        assert_eq!(license.state(now), LicenseState::Active);
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let mut license = sample(LicenseType::Patchable);
        license.expires_at = Some(now);
        assert!(!license.is_expired(now));
        assert!(license.is_expired(now + Duration::seconds(1)));
        assert!(!license.is_expired(now - Duration::seconds(1)));
    }

    #[test]
    fn test_readonly_rejects_patch() {
        let license = sample(LicenseType::Readonly);
        let patch = LicensePatch {
            max_executions: Some(Some(10)),
            ..Default::default()
        };
        let err = license.apply_patch(&patch, Utc::now()).unwrap_err();
        assert_eq!(err.kind, warden_core::error::ErrorKind::Immutable);
        // Original row image is untouched by construction; verify the cap
        // the patch tried to raise is still in place.
        assert_eq!(license.max_executions, Some(3));
    }

    #[test]
    fn test_readonly_allows_empty_patch() {
        let license = sample(LicenseType::Readonly);
        let updated = license
            .apply_patch(&LicensePatch::default(), Utc::now())
            .unwrap();
        assert_eq!(updated.max_executions, license.max_executions);
    }

    #[test]
    fn test_partial_patch_keeps_omitted_fields() {
        let license = sample(LicenseType::Patchable);
        let now = Utc::now();
        let patch = LicensePatch {
            check_interval_ms: Some(30_000),
            ..Default::default()
        };
        let updated = license.apply_patch(&patch, now).unwrap();
        assert_eq!(updated.check_interval_ms, 30_000);
        assert_eq!(updated.kill_method, license.kill_method);
        assert_eq!(updated.max_executions, license.max_executions);
    }

    #[test]
    fn test_patch_clears_nullable_fields() {
        let license = sample(LicenseType::Patchable);
        let now = Utc::now();
        let patch = LicensePatch {
            max_executions: Some(None),
            expires_in_seconds: Some(Some(120)),
            ..Default::default()
        };
        let updated = license.apply_patch(&patch, now).unwrap();
        assert_eq!(updated.max_executions, None);
        assert_eq!(updated.expires_at, Some(now + Duration::seconds(120)));
    }

    #[test]
    fn test_patch_validation() {
        let license = sample(LicenseType::Patchable);
        let patch = LicensePatch {
            check_interval_ms: Some(0),
            ..Default::default()
        };
        assert!(license.apply_patch(&patch, Utc::now()).is_err());
    }

    #[test]
    fn test_create_validation() {
        let mut create = CreateLicense {
            binary_id: Uuid::new_v4(),
            license_type: LicenseType::Patchable,
            sync_mode: true,
            grace_period_seconds: None,
            network_failure_kill_count: 1,
            check_interval_ms: 60_000,
            kill_method: KillMethod::Shred,
            max_executions: None,
            expires_in_seconds: None,
        };
        assert!(create.validate().is_ok());

        create.network_failure_kill_count = 0;
        assert!(create.validate().is_err());
    }
}
