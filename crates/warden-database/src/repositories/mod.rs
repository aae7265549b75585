//! PostgreSQL implementations of the store traits.

pub mod attempt;
pub mod binary;
pub mod license;
pub mod machine;
pub mod snapshot;
pub mod token;
pub mod verification;

use async_trait::async_trait;
use sqlx::PgPool;

use warden_core::AppResult;
use warden_core::error::{AppError, ErrorKind};

use crate::stores::StoreHealth;

pub use attempt::AttemptRepository;
pub use binary::BinaryRepository;
pub use license::LicenseRepository;
pub use machine::MachineRepository;
pub use snapshot::SnapshotRepository;
pub use token::TokenRepository;
pub use verification::PgVerificationStore;

/// Liveness probe over the shared connection pool.
#[derive(Debug, Clone)]
pub struct PgHealthProbe {
    pool: PgPool,
}

impl PgHealthProbe {
    /// Create a new probe.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreHealth for PgHealthProbe {
    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }
}
