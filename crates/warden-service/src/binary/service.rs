//! Binary upload, listing, attempt history, and the two-step download.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bytes::Bytes;
use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use warden_auth::OperatorRole;
use warden_core::{AppError, AppResult};
use warden_database::stores::{AttemptStore, BinaryStore, TokenStore};
use warden_entity::binary::{Binary, BinarySummary};
use warden_entity::token::DownloadToken;
use warden_entity::verification::VerificationAttempt;

use crate::context::RequestContext;

use super::artifact::ArtifactStore;

/// Service for protected binary artifacts and their download tokens.
#[derive(Clone)]
pub struct BinaryService {
    binaries: Arc<dyn BinaryStore>,
    tokens: Arc<dyn TokenStore>,
    attempts: Arc<dyn AttemptStore>,
    artifacts: ArtifactStore,
    token_ttl_seconds: i64,
}

impl std::fmt::Debug for BinaryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryService").finish()
    }
}

impl BinaryService {
    /// Create a new binary service.
    pub fn new(
        binaries: Arc<dyn BinaryStore>,
        tokens: Arc<dyn TokenStore>,
        attempts: Arc<dyn AttemptStore>,
        artifacts: ArtifactStore,
        token_ttl_seconds: i64,
    ) -> Self {
        Self {
            binaries,
            tokens,
            attempts,
            artifacts,
            token_ttl_seconds,
        }
    }

    /// Store an uploaded wrapped binary.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        name: String,
        original_size: i64,
        data: Bytes,
    ) -> AppResult<Binary> {
        ctx.require(OperatorRole::Operator)?;
        if name.is_empty() {
            return Err(AppError::validation("Binary name cannot be empty"));
        }
        if data.is_empty() {
            return Err(AppError::validation("Uploaded binary is empty"));
        }

        let now = Utc::now();
        let id = Uuid::new_v4();
        let artifact_path = format!("{id}.bin");
        self.artifacts.write(&artifact_path, &data).await?;

        let binary = Binary {
            id,
            name,
            original_size,
            wrapped_size: data.len() as i64,
            artifact_path,
            created_at: now,
            updated_at: now,
        };
        let created = self.binaries.insert(&binary).await?;
        info!(
            binary_id = %created.id,
            name = %created.name,
            wrapped_size = created.wrapped_size,
            operator = %ctx.operator,
            "Binary uploaded"
        );
        Ok(created)
    }

    /// Fetch one binary.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Binary> {
        ctx.require(OperatorRole::Viewer)?;
        self.binaries
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Binary {id} not found")))
    }

    /// List all binaries with license counts.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<BinarySummary>> {
        ctx.require(OperatorRole::Viewer)?;
        self.binaries.list().await
    }

    /// Paginated verification attempt history for a binary.
    pub async fn attempts(
        &self,
        ctx: &RequestContext,
        binary_id: Uuid,
        limit: i64,
        skip: i64,
    ) -> AppResult<(Vec<VerificationAttempt>, u64)> {
        ctx.require(OperatorRole::Viewer)?;
        self.binaries
            .find_by_id(binary_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Binary {binary_id} not found")))?;

        let attempts = self.attempts.by_binary(binary_id, limit, skip).await?;
        let total = self.attempts.count_by_binary(binary_id).await?;
        Ok((attempts, total))
    }

    /// Issue a one-time download token for a binary.
    pub async fn issue_download_token(
        &self,
        ctx: &RequestContext,
        binary_id: Uuid,
    ) -> AppResult<DownloadToken> {
        ctx.require(OperatorRole::Operator)?;
        self.binaries
            .find_by_id(binary_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Binary {binary_id} not found")))?;

        let now = Utc::now();
        let material: [u8; 32] = rand::random();
        let token = DownloadToken {
            id: Uuid::new_v4(),
            binary_id,
            token: URL_SAFE_NO_PAD.encode(material),
            expires_at: now + Duration::seconds(self.token_ttl_seconds),
            consumed_at: None,
            created_at: now,
        };
        let issued = self.tokens.insert(&token).await?;
        info!(binary_id = %binary_id, operator = %ctx.operator, "Download token issued");
        Ok(issued)
    }

    /// Redeem a download token and open the artifact for streaming.
    ///
    /// Unauthenticated by design: the single-use token is the
    /// credential. Consumption is atomic, so a token redeems exactly
    /// once even under concurrent requests.
    pub async fn redeem_download(
        &self,
        binary_id: Uuid,
        token: &str,
    ) -> AppResult<(Binary, tokio::fs::File)> {
        let now = Utc::now();
        self.tokens
            .consume(binary_id, token, now)
            .await?
            .ok_or_else(|| {
                AppError::authorization("Download token is invalid, expired, or already used")
            })?;

        let binary = self
            .binaries
            .find_by_id(binary_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Binary {binary_id} not found")))?;

        let file = self.artifacts.open(&binary.artifact_path).await?;
        Ok((binary, file))
    }
}
