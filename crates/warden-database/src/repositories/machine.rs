//! Machine instance repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::machine::MachineInstance;

use crate::stores::MachineStore;

/// Repository for machine instance rows.
#[derive(Debug, Clone)]
pub struct MachineRepository {
    pool: PgPool,
}

impl MachineRepository {
    /// Create a new machine repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MachineStore for MachineRepository {
    async fn find(
        &self,
        license_id: Uuid,
        fingerprint: &str,
    ) -> AppResult<Option<MachineInstance>> {
        sqlx::query_as::<_, MachineInstance>(
            "SELECT * FROM machine_instances WHERE license_id = $1 AND machine_fingerprint = $2",
        )
        .bind(license_id)
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find machine", e))
    }

    async fn find_by_license(&self, license_id: Uuid) -> AppResult<Vec<MachineInstance>> {
        sqlx::query_as::<_, MachineInstance>(
            "SELECT * FROM machine_instances WHERE license_id = $1 ORDER BY last_seen DESC",
        )
        .bind(license_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list license machines", e)
        })
    }

    async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM machine_instances")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count machines", e)
            })?;
        Ok(count as u64)
    }
}
