//! PostgreSQL implementation of the verification engine's store seam.
//!
//! One commit is one transaction: license counter update guarded by the
//! version column, machine upsert, and attempt append either all land
//! or none do. A version mismatch surfaces as a conflict so the engine
//! can retry its read-decide-write cycle.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::license::License;
use warden_entity::machine::MachineInstance;

use crate::stores::{CounterUpdate, VerificationSnapshot, VerificationStore, VerificationWriteSet};

/// Transactional store for the verification engine.
#[derive(Debug, Clone)]
pub struct PgVerificationStore {
    pool: PgPool,
}

impl PgVerificationStore {
    /// Create a new verification store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationStore for PgVerificationStore {
    async fn snapshot(
        &self,
        license_id: Uuid,
        fingerprint: &str,
    ) -> AppResult<Option<VerificationSnapshot>> {
        let license = sqlx::query_as::<_, License>("SELECT * FROM licenses WHERE id = $1")
            .bind(license_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read license snapshot", e)
            })?;

        let Some(license) = license else {
            return Ok(None);
        };

        let machine = sqlx::query_as::<_, MachineInstance>(
            "SELECT * FROM machine_instances WHERE license_id = $1 AND machine_fingerprint = $2",
        )
        .bind(license_id)
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to read machine snapshot", e)
        })?;

        Ok(Some(VerificationSnapshot { license, machine }))
    }

    async fn commit(&self, write: VerificationWriteSet) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let updated = match write.counters {
            CounterUpdate::Success { count_execution } => {
                sqlx::query(
                    "UPDATE licenses SET failed_attempts = 0, \
                     executions_used = executions_used + $3, \
                     version = version + 1, updated_at = $4 \
                     WHERE id = $1 AND version = $2",
                )
                .bind(write.license_id)
                .bind(write.expected_version)
                .bind(if count_execution { 1_i64 } else { 0 })
                .bind(write.attempt.timestamp)
                .execute(&mut *tx)
                .await
            }
            CounterUpdate::Failure => {
                sqlx::query(
                    "UPDATE licenses SET failed_attempts = failed_attempts + 1, \
                     version = version + 1, updated_at = $3 \
                     WHERE id = $1 AND version = $2",
                )
                .bind(write.license_id)
                .bind(write.expected_version)
                .bind(write.attempt.timestamp)
                .execute(&mut *tx)
                .await
            }
        }
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update license counters", e)
        })?;

        if updated.rows_affected() == 0 {
            // Another request for this pair committed first; the whole
            // write-set is stale.
            tx.rollback().await.ok();
            return Err(AppError::conflict(format!(
                "License {} version moved past {}",
                write.license_id, write.expected_version
            )));
        }

        if let Some(machine) = &write.machine {
            sqlx::query(
                "INSERT INTO machine_instances \
                 (id, license_id, machine_fingerprint, first_seen, last_seen, total_checks, last_ip) \
                 VALUES ($1, $2, $3, $4, $4, 1, $5) \
                 ON CONFLICT (license_id, machine_fingerprint) DO UPDATE SET \
                 last_seen = EXCLUDED.last_seen, \
                 last_ip = EXCLUDED.last_ip, \
                 total_checks = machine_instances.total_checks + 1",
            )
            .bind(Uuid::new_v4())
            .bind(machine.license_id)
            .bind(&machine.machine_fingerprint)
            .bind(machine.seen_at)
            .bind(&machine.ip_address)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to upsert machine", e)
            })?;
        }

        sqlx::query(
            "INSERT INTO verification_attempts \
             (id, timestamp, license_id, machine_fingerprint, ip_address, success, \
              error_message, within_grace_period) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::new_v4())
        .bind(write.attempt.timestamp)
        .bind(write.attempt.license_id)
        .bind(&write.attempt.machine_fingerprint)
        .bind(&write.attempt.ip_address)
        .bind(write.attempt.success)
        .bind(&write.attempt.error_message)
        .bind(write.attempt.within_grace_period)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to append attempt", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit write-set", e)
        })?;

        Ok(())
    }
}
