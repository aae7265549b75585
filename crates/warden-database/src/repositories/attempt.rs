//! Verification attempt log repository implementation.
//!
//! The log is append-only; appends happen inside the verification
//! write-set transaction, so this repository only exposes reads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::verification::VerificationAttempt;

use crate::stores::AttemptStore;

/// Repository for the verification attempt log.
#[derive(Debug, Clone)]
pub struct AttemptRepository {
    pool: PgPool,
}

impl AttemptRepository {
    /// Create a new attempt repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttemptStore for AttemptRepository {
    async fn recent_by_license(
        &self,
        license_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<VerificationAttempt>> {
        sqlx::query_as::<_, VerificationAttempt>(
            "SELECT * FROM verification_attempts WHERE license_id = $1 \
             ORDER BY timestamp DESC LIMIT $2",
        )
        .bind(license_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list license attempts", e)
        })
    }

    async fn by_binary(
        &self,
        binary_id: Uuid,
        limit: i64,
        skip: i64,
    ) -> AppResult<Vec<VerificationAttempt>> {
        sqlx::query_as::<_, VerificationAttempt>(
            "SELECT a.* FROM verification_attempts a \
             JOIN licenses l ON l.id = a.license_id \
             WHERE l.binary_id = $1 \
             ORDER BY a.timestamp DESC LIMIT $2 OFFSET $3",
        )
        .bind(binary_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list binary attempts", e)
        })
    }

    async fn count_by_binary(&self, binary_id: Uuid) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM verification_attempts a \
             JOIN licenses l ON l.id = a.license_id WHERE l.binary_id = $1",
        )
        .bind(binary_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count binary attempts", e)
        })?;
        Ok(count as u64)
    }

    async fn since(&self, from: DateTime<Utc>) -> AppResult<Vec<VerificationAttempt>> {
        sqlx::query_as::<_, VerificationAttempt>(
            "SELECT * FROM verification_attempts WHERE timestamp >= $1 ORDER BY timestamp ASC",
        )
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list window attempts", e)
        })
    }

    async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verification_attempts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count attempts", e)
            })?;
        Ok(count as u64)
    }
}
