//! Moka-backed license cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;
use uuid::Uuid;

use warden_core::config::cache::CacheConfig;
use warden_entity::license::License;

/// Short-TTL cache of license rows keyed by license id.
///
/// Every mutation path invalidates its entry synchronously before the
/// mutation call returns, so dashboard reads never serve a revoked
/// license as active for longer than one in-flight request.
#[derive(Debug, Clone)]
pub struct LicenseCache {
    cache: Cache<Uuid, Arc<License>>,
}

impl LicenseCache {
    /// Create a cache from configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_live(Duration::from_millis(config.ttl_ms))
            .build();
        Self { cache }
    }

    /// Look up a cached license.
    pub async fn get(&self, id: Uuid) -> Option<Arc<License>> {
        self.cache.get(&id).await
    }

    /// Store a freshly loaded license.
    pub async fn insert(&self, license: License) {
        self.cache.insert(license.id, Arc::new(license)).await;
    }

    /// Drop the entry for a mutated license.
    ///
    /// Must be awaited on the mutation path before returning to the
    /// caller; this is the synchronous invalidation signal that keeps
    /// the cache safe despite its TTL.
    pub async fn invalidate(&self, id: Uuid) {
        debug!(license_id = %id, "Invalidating cached license");
        self.cache.invalidate(&id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use warden_entity::license::{KillMethod, LicenseType};

    fn sample() -> License {
        let now = Utc::now();
        License {
            id: Uuid::new_v4(),
            binary_id: Uuid::new_v4(),
            license_type: LicenseType::Patchable,
            sync_mode: false,
            network_failure_kill_count: 5,
            grace_period_seconds: None,
            check_interval_ms: 60_000,
            kill_method: KillMethod::Stop,
            max_executions: None,
            expires_at: None,
            executions_used: 0,
            failed_attempts: 0,
            revoked: false,
            revoked_at: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_get_invalidate() {
        let cache = LicenseCache::new(&CacheConfig::default());
        let license = sample();
        let id = license.id;

        assert!(cache.get(id).await.is_none());
        cache.insert(license).await;
        assert!(cache.get(id).await.is_some());

        cache.invalidate(id).await;
        assert!(cache.get(id).await.is_none());
    }
}
