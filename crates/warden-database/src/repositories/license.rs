//! License repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_core::types::pagination::{PageRequest, PageResponse};
use warden_core::types::sorting::SortOrder;
use warden_entity::license::License;

use crate::stores::{LicenseSortKey, LicenseStore};

/// Repository for license rows.
#[derive(Debug, Clone)]
pub struct LicenseRepository {
    pool: PgPool,
}

impl LicenseRepository {
    /// Create a new license repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LicenseStore for LicenseRepository {
    async fn insert(&self, license: &License) -> AppResult<License> {
        sqlx::query_as::<_, License>(
            "INSERT INTO licenses (id, binary_id, license_type, sync_mode, \
             network_failure_kill_count, grace_period_seconds, check_interval_ms, kill_method, \
             max_executions, expires_at, executions_used, failed_attempts, revoked, revoked_at, \
             version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING *",
        )
        .bind(license.id)
        .bind(license.binary_id)
        .bind(license.license_type)
        .bind(license.sync_mode)
        .bind(license.network_failure_kill_count)
        .bind(license.grace_period_seconds)
        .bind(license.check_interval_ms)
        .bind(license.kill_method)
        .bind(license.max_executions)
        .bind(license.expires_at)
        .bind(license.executions_used)
        .bind(license.failed_attempts)
        .bind(license.revoked)
        .bind(license.revoked_at)
        .bind(license.version)
        .bind(license.created_at)
        .bind(license.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("licenses_binary_id_fkey") =>
            {
                AppError::not_found(format!("Binary {} not found", license.binary_id))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create license", e),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<License>> {
        sqlx::query_as::<_, License>("SELECT * FROM licenses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find license", e))
    }

    async fn find_by_binary(&self, binary_id: Uuid) -> AppResult<Vec<License>> {
        sqlx::query_as::<_, License>(
            "SELECT * FROM licenses WHERE binary_id = $1 ORDER BY created_at DESC",
        )
        .bind(binary_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list binary licenses", e)
        })
    }

    async fn find_all(
        &self,
        page: &PageRequest,
        sort_by: LicenseSortKey,
        order: SortOrder,
    ) -> AppResult<PageResponse<License>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM licenses")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count licenses", e)
            })?;

        // Column and direction come from whitelisted enums, never raw input.
        let query = format!(
            "SELECT * FROM licenses ORDER BY {} {} LIMIT $1 OFFSET $2",
            sort_by.column(),
            order.as_sql()
        );
        let licenses = sqlx::query_as::<_, License>(&query)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list licenses", e))?;

        Ok(PageResponse::new(
            licenses,
            page.page,
            page.per_page,
            total as u64,
        ))
    }

    async fn list_all(&self) -> AppResult<Vec<License>> {
        sqlx::query_as::<_, License>("SELECT * FROM licenses")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list licenses", e))
    }

    async fn update_guarded(&self, updated: &License, expected_version: i64) -> AppResult<License> {
        let row = sqlx::query_as::<_, License>(
            "UPDATE licenses SET check_interval_ms = $3, kill_method = $4, max_executions = $5, \
             expires_at = $6, updated_at = $7, version = version + 1 \
             WHERE id = $1 AND version = $2 RETURNING *",
        )
        .bind(updated.id)
        .bind(expected_version)
        .bind(updated.check_interval_ms)
        .bind(updated.kill_method)
        .bind(updated.max_executions)
        .bind(updated.expires_at)
        .bind(updated.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to patch license", e))?;

        row.ok_or_else(|| {
            AppError::conflict(format!(
                "License {} was modified concurrently; retry the patch",
                updated.id
            ))
        })
    }

    async fn set_revoked(&self, id: Uuid, revoked: bool, now: DateTime<Utc>) -> AppResult<License> {
        // Idempotent by construction: a no-op flip leaves revoked_at alone
        // and still bumps nothing observable besides updated_at.
        let row = sqlx::query_as::<_, License>(
            "UPDATE licenses SET \
               revoked_at = CASE \
                 WHEN $2 AND NOT revoked THEN $3 \
                 WHEN NOT $2 THEN NULL \
                 ELSE revoked_at END, \
               revoked = $2, \
               updated_at = CASE WHEN revoked = $2 THEN updated_at ELSE $3 END, \
               version = CASE WHEN revoked = $2 THEN version ELSE version + 1 END \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(revoked)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update revocation", e)
        })?;

        row.ok_or_else(|| AppError::not_found(format!("License {id} not found")))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM licenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete license", e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM licenses")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count licenses", e)
            })?;
        Ok(count as u64)
    }
}
