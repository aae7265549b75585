//! Telemetry snapshot repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::snapshot::TelemetrySnapshot;

use crate::stores::SnapshotStore;

/// Repository for persisted telemetry snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: PgPool,
}

impl SnapshotRepository {
    /// Create a new snapshot repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for SnapshotRepository {
    async fn insert(&self, snapshot: &TelemetrySnapshot) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO telemetry_snapshots (id, captured_at, window_start, window_end, report) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(snapshot.id)
        .bind(snapshot.captured_at)
        .bind(snapshot.window_start)
        .bind(snapshot.window_end)
        .bind(&snapshot.report)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store snapshot", e))?;
        Ok(())
    }

    async fn latest(&self) -> AppResult<Option<TelemetrySnapshot>> {
        sqlx::query_as::<_, TelemetrySnapshot>(
            "SELECT * FROM telemetry_snapshots ORDER BY captured_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load snapshot", e))
    }
}
