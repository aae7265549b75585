//! Binary repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::binary::{Binary, BinarySummary};

use crate::stores::BinaryStore;

/// Repository for protected binary rows.
#[derive(Debug, Clone)]
pub struct BinaryRepository {
    pool: PgPool,
}

impl BinaryRepository {
    /// Create a new binary repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BinaryStore for BinaryRepository {
    async fn insert(&self, binary: &Binary) -> AppResult<Binary> {
        sqlx::query_as::<_, Binary>(
            "INSERT INTO binaries (id, name, original_size, wrapped_size, artifact_path, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(binary.id)
        .bind(&binary.name)
        .bind(binary.original_size)
        .bind(binary.wrapped_size)
        .bind(&binary.artifact_path)
        .bind(binary.created_at)
        .bind(binary.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create binary", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Binary>> {
        sqlx::query_as::<_, Binary>("SELECT * FROM binaries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find binary", e))
    }

    async fn list(&self) -> AppResult<Vec<BinarySummary>> {
        sqlx::query_as::<_, BinarySummary>(
            "SELECT b.id, b.name, b.original_size, b.wrapped_size, \
             COUNT(l.id) AS license_count, b.created_at \
             FROM binaries b LEFT JOIN licenses l ON l.binary_id = b.id \
             GROUP BY b.id ORDER BY b.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list binaries", e))
    }

    async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM binaries")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count binaries", e)
            })?;
        Ok(count as u64)
    }
}
