//! Download token repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::token::DownloadToken;

use crate::stores::TokenStore;

/// Repository for one-time download tokens.
#[derive(Debug, Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    /// Create a new token repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for TokenRepository {
    async fn insert(&self, token: &DownloadToken) -> AppResult<DownloadToken> {
        sqlx::query_as::<_, DownloadToken>(
            "INSERT INTO download_tokens (id, binary_id, token, expires_at, consumed_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(token.id)
        .bind(token.binary_id)
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(token.consumed_at)
        .bind(token.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to issue token", e))
    }

    async fn consume(
        &self,
        binary_id: Uuid,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DownloadToken>> {
        // Single-use is enforced by the conditional UPDATE: a second
        // redemption matches zero rows.
        sqlx::query_as::<_, DownloadToken>(
            "UPDATE download_tokens SET consumed_at = $3 \
             WHERE binary_id = $1 AND token = $2 AND consumed_at IS NULL AND expires_at >= $3 \
             RETURNING *",
        )
        .bind(binary_id)
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to redeem token", e))
    }

    async fn delete_stale(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM download_tokens WHERE expires_at < $1 OR consumed_at IS NOT NULL",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete stale tokens", e)
        })?;
        Ok(result.rows_affected())
    }
}
