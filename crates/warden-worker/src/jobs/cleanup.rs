//! Expired download-token cleanup job.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use warden_core::AppResult;
use warden_database::stores::TokenStore;

/// Deletes expired and consumed download tokens.
#[derive(Clone)]
pub struct TokenCleanupJob {
    tokens: Arc<dyn TokenStore>,
}

impl TokenCleanupJob {
    /// Create a new cleanup job.
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self { tokens }
    }

    /// Run one cleanup pass; returns how many tokens were removed.
    pub async fn run(&self) -> AppResult<u64> {
        let removed = self.tokens.delete_stale(Utc::now()).await?;
        if removed > 0 {
            info!(removed, "Stale download tokens deleted");
        } else {
            debug!("No stale download tokens");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;
    use warden_database::memory::MemoryStore;
    use warden_entity::token::DownloadToken;

    #[tokio::test]
    async fn test_cleanup_removes_only_stale_tokens() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();

        let fresh = DownloadToken {
            id: Uuid::new_v4(),
            binary_id: Uuid::new_v4(),
            token: "fresh".to_string(),
            expires_at: now + Duration::minutes(5),
            consumed_at: None,
            created_at: now,
        };
        let expired = DownloadToken {
            id: Uuid::new_v4(),
            binary_id: Uuid::new_v4(),
            token: "expired".to_string(),
            expires_at: now - Duration::minutes(5),
            consumed_at: None,
            created_at: now - Duration::hours(1),
        };
        store.insert(&fresh).await.unwrap();
        store.insert(&expired).await.unwrap();

        let job = TokenCleanupJob::new(store.clone());
        assert_eq!(job.run().await.unwrap(), 1);
        // Idempotent: a second pass finds nothing.
        assert_eq!(job.run().await.unwrap(), 0);
    }
}
