//! The license mutation service.
//!
//! Enforces the readonly/patchable contract, the revocation lifecycle,
//! and the synchronous cache invalidation every mutation owes the read
//! side.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use warden_auth::OperatorRole;
use warden_cache::LicenseCache;
use warden_core::types::pagination::{PageRequest, PageResponse};
use warden_core::types::sorting::SortOrder;
use warden_core::{AppError, AppResult};
use warden_database::stores::{
    AttemptStore, BinaryStore, LicenseSortKey, LicenseStore, MachineStore,
};
use warden_entity::license::{CreateLicense, License, LicensePatch, LicenseState};
use warden_entity::machine::{MachineInstance, MachineStatus};
use warden_entity::verification::VerificationAttempt;

use crate::context::RequestContext;

/// How many recent attempts a stats view includes.
const STATS_ATTEMPT_LIMIT: i64 = 50;

/// A machine instance with its computed liveness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineWithStatus {
    /// The stored instance row.
    #[serde(flatten)]
    pub instance: MachineInstance,
    /// Liveness derived from the license's interval and grace period.
    pub status: MachineStatus,
}

/// Per-license stats view: instances plus recent verifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseStats {
    /// The license row.
    pub license: License,
    /// Computed lifecycle state.
    pub state: LicenseState,
    /// All machine instances with liveness.
    pub machines: Vec<MachineWithStatus>,
    /// Most recent verification attempts, newest first.
    pub recent_attempts: Vec<VerificationAttempt>,
}

/// Create, patch, revoke, re-enable, and delete licenses.
#[derive(Clone)]
pub struct LicenseService {
    licenses: Arc<dyn LicenseStore>,
    machines: Arc<dyn MachineStore>,
    attempts: Arc<dyn AttemptStore>,
    binaries: Arc<dyn BinaryStore>,
    cache: LicenseCache,
}

impl std::fmt::Debug for LicenseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseService").finish()
    }
}

impl LicenseService {
    /// Create a new license service.
    pub fn new(
        licenses: Arc<dyn LicenseStore>,
        machines: Arc<dyn MachineStore>,
        attempts: Arc<dyn AttemptStore>,
        binaries: Arc<dyn BinaryStore>,
        cache: LicenseCache,
    ) -> Self {
        Self {
            licenses,
            machines,
            attempts,
            binaries,
            cache,
        }
    }

    /// Create a new license for a binary.
    ///
    /// `license_type`, `sync_mode`, `grace_period`, and
    /// `network_failure_kill_count` are fixed forever at this point.
    pub async fn create(&self, ctx: &RequestContext, data: CreateLicense) -> AppResult<License> {
        ctx.require(OperatorRole::Operator)?;
        data.validate()?;

        self.binaries
            .find_by_id(data.binary_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Binary {} not found", data.binary_id)))?;

        let now = Utc::now();
        let license = License {
            id: Uuid::new_v4(),
            binary_id: data.binary_id,
            license_type: data.license_type,
            sync_mode: data.sync_mode,
            network_failure_kill_count: data.network_failure_kill_count,
            grace_period_seconds: data.grace_period_seconds,
            check_interval_ms: data.check_interval_ms,
            kill_method: data.kill_method,
            max_executions: data.max_executions,
            expires_at: data.expires_in_seconds.map(|s| now + Duration::seconds(s)),
            executions_used: 0,
            failed_attempts: 0,
            revoked: false,
            revoked_at: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let created = self.licenses.insert(&license).await?;
        info!(
            license_id = %created.id,
            binary_id = %created.binary_id,
            license_type = %created.license_type,
            operator = %ctx.operator,
            "License created"
        );
        Ok(created)
    }

    /// Fetch a license, via the read cache.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> AppResult<License> {
        ctx.require(OperatorRole::Viewer)?;
        if let Some(cached) = self.cache.get(id).await {
            return Ok((*cached).clone());
        }
        let license = self
            .licenses
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("License {id} not found")))?;
        self.cache.insert(license.clone()).await;
        Ok(license)
    }

    /// List licenses with pagination and sorting.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        page: &PageRequest,
        sort_by: LicenseSortKey,
        order: SortOrder,
    ) -> AppResult<PageResponse<License>> {
        ctx.require(OperatorRole::Viewer)?;
        self.licenses.find_all(page, sort_by, order).await
    }

    /// List every license attached to a binary.
    pub async fn list_for_binary(
        &self,
        ctx: &RequestContext,
        binary_id: Uuid,
    ) -> AppResult<Vec<License>> {
        ctx.require(OperatorRole::Viewer)?;
        self.binaries
            .find_by_id(binary_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Binary {binary_id} not found")))?;
        self.licenses.find_by_binary(binary_id).await
    }

    /// Apply a patch to the mutable fields.
    ///
    /// Rejected outright on readonly licenses; the row is read from the
    /// authoritative store (never the cache) and committed with a
    /// version guard so a racing mutation surfaces as a retryable
    /// conflict instead of silently clobbering.
    pub async fn patch(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        patch: LicensePatch,
    ) -> AppResult<License> {
        ctx.require(OperatorRole::Operator)?;

        let current = self
            .licenses
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("License {id} not found")))?;

        let updated = current.apply_patch(&patch, Utc::now())?;
        let committed = self.licenses.update_guarded(&updated, current.version).await?;

        self.cache.invalidate(id).await;
        info!(license_id = %id, operator = %ctx.operator, "License patched");
        Ok(committed)
    }

    /// Revoke a license. Idempotent and allowed for both license types:
    /// revocation is a lifecycle axis, not a patch.
    pub async fn revoke(&self, ctx: &RequestContext, id: Uuid) -> AppResult<License> {
        ctx.require(OperatorRole::Operator)?;
        let license = self.licenses.set_revoked(id, true, Utc::now()).await?;
        self.cache.invalidate(id).await;
        info!(license_id = %id, operator = %ctx.operator, "License revoked");
        Ok(license)
    }

    /// Re-enable a revoked license. Resets no counters and extends no
    /// expiry: an exhausted or expired license stays KILL-bound until
    /// its limits are also patched.
    pub async fn re_enable(&self, ctx: &RequestContext, id: Uuid) -> AppResult<License> {
        ctx.require(OperatorRole::Operator)?;
        let license = self.licenses.set_revoked(id, false, Utc::now()).await?;
        self.cache.invalidate(id).await;
        info!(license_id = %id, operator = %ctx.operator, "License re-enabled");
        Ok(license)
    }

    /// Hard-delete a license with its machine instances and attempts.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        ctx.require(OperatorRole::Admin)?;
        if !self.licenses.delete(id).await? {
            return Err(AppError::not_found(format!("License {id} not found")));
        }
        self.cache.invalidate(id).await;
        info!(license_id = %id, operator = %ctx.operator, "License deleted");
        Ok(())
    }

    /// Assemble the stats view: machine instances with computed
    /// liveness plus recent verification attempts.
    pub async fn stats(&self, ctx: &RequestContext, id: Uuid) -> AppResult<LicenseStats> {
        ctx.require(OperatorRole::Viewer)?;

        let license = self
            .licenses
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("License {id} not found")))?;

        let now = Utc::now();
        let machines = self
            .machines
            .find_by_license(id)
            .await?
            .into_iter()
            .map(|instance| {
                let status = instance.status(&license, now);
                MachineWithStatus { instance, status }
            })
            .collect();

        let recent_attempts = self.attempts.recent_by_license(id, STATS_ATTEMPT_LIMIT).await?;
        let state = license.state(now);

        Ok(LicenseStats {
            license,
            state,
            machines,
            recent_attempts,
        })
    }
}
