//! In-memory store implementing every store trait behind one Tokio
//! mutex. Suitable for tests and single-node development only; the
//! coarse lock gives the same atomicity guarantees the PostgreSQL
//! transaction provides.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use warden_core::AppResult;
use warden_core::error::AppError;
use warden_core::types::pagination::{PageRequest, PageResponse};
use warden_core::types::sorting::SortOrder;

use warden_entity::binary::{Binary, BinarySummary};
use warden_entity::license::License;
use warden_entity::machine::MachineInstance;
use warden_entity::snapshot::TelemetrySnapshot;
use warden_entity::token::DownloadToken;
use warden_entity::verification::VerificationAttempt;

use crate::stores::{
    AttemptStore, BinaryStore, CounterUpdate, LicenseSortKey, LicenseStore, MachineStore,
    SnapshotStore, StoreHealth, TokenStore, VerificationSnapshot, VerificationStore,
    VerificationWriteSet,
};

#[derive(Debug, Default)]
struct Inner {
    binaries: HashMap<Uuid, Binary>,
    licenses: HashMap<Uuid, License>,
    machines: HashMap<(Uuid, String), MachineInstance>,
    attempts: Vec<VerificationAttempt>,
    tokens: HashMap<Uuid, DownloadToken>,
    snapshots: Vec<TelemetrySnapshot>,
}

/// In-memory store backing all Warden store traits.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LicenseStore for MemoryStore {
    async fn insert(&self, license: &License) -> AppResult<License> {
        let mut state = self.state.lock().await;
        if !state.binaries.contains_key(&license.binary_id) {
            return Err(AppError::not_found(format!(
                "Binary {} not found",
                license.binary_id
            )));
        }
        state.licenses.insert(license.id, license.clone());
        Ok(license.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<License>> {
        Ok(self.state.lock().await.licenses.get(&id).cloned())
    }

    async fn find_by_binary(&self, binary_id: Uuid) -> AppResult<Vec<License>> {
        let state = self.state.lock().await;
        let mut licenses: Vec<License> = state
            .licenses
            .values()
            .filter(|l| l.binary_id == binary_id)
            .cloned()
            .collect();
        licenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(licenses)
    }

    async fn find_all(
        &self,
        page: &PageRequest,
        sort_by: LicenseSortKey,
        order: SortOrder,
    ) -> AppResult<PageResponse<License>> {
        let state = self.state.lock().await;
        let mut licenses: Vec<License> = state.licenses.values().cloned().collect();
        licenses.sort_by(|a, b| {
            let ordering = match sort_by {
                LicenseSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                LicenseSortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                LicenseSortKey::ExpiresAt => a.expires_at.cmp(&b.expires_at),
                LicenseSortKey::ExecutionsUsed => a.executions_used.cmp(&b.executions_used),
            };
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = licenses.len() as u64;
        let items: Vec<License> = licenses
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page.page, page.per_page, total))
    }

    async fn list_all(&self) -> AppResult<Vec<License>> {
        Ok(self.state.lock().await.licenses.values().cloned().collect())
    }

    async fn update_guarded(&self, updated: &License, expected_version: i64) -> AppResult<License> {
        let mut state = self.state.lock().await;
        let current = state
            .licenses
            .get_mut(&updated.id)
            .ok_or_else(|| AppError::not_found(format!("License {} not found", updated.id)))?;
        if current.version != expected_version {
            return Err(AppError::conflict(format!(
                "License {} was modified concurrently; retry the patch",
                updated.id
            )));
        }
        let mut row = updated.clone();
        row.version = current.version + 1;
        *current = row.clone();
        Ok(row)
    }

    async fn set_revoked(&self, id: Uuid, revoked: bool, now: DateTime<Utc>) -> AppResult<License> {
        let mut state = self.state.lock().await;
        let license = state
            .licenses
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("License {id} not found")))?;
        if license.revoked != revoked {
            license.revoked = revoked;
            license.revoked_at = if revoked { Some(now) } else { None };
            license.updated_at = now;
            license.version += 1;
        }
        Ok(license.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let removed = state.licenses.remove(&id).is_some();
        if removed {
            state.machines.retain(|(license_id, _), _| *license_id != id);
            state.attempts.retain(|a| a.license_id != id);
        }
        Ok(removed)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.state.lock().await.licenses.len() as u64)
    }
}

#[async_trait]
impl MachineStore for MemoryStore {
    async fn find(
        &self,
        license_id: Uuid,
        fingerprint: &str,
    ) -> AppResult<Option<MachineInstance>> {
        Ok(self
            .state
            .lock()
            .await
            .machines
            .get(&(license_id, fingerprint.to_string()))
            .cloned())
    }

    async fn find_by_license(&self, license_id: Uuid) -> AppResult<Vec<MachineInstance>> {
        let state = self.state.lock().await;
        let mut machines: Vec<MachineInstance> = state
            .machines
            .values()
            .filter(|m| m.license_id == license_id)
            .cloned()
            .collect();
        machines.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        Ok(machines)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.state.lock().await.machines.len() as u64)
    }
}

#[async_trait]
impl AttemptStore for MemoryStore {
    async fn recent_by_license(
        &self,
        license_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<VerificationAttempt>> {
        let state = self.state.lock().await;
        let mut attempts: Vec<VerificationAttempt> = state
            .attempts
            .iter()
            .filter(|a| a.license_id == license_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        attempts.truncate(limit.max(0) as usize);
        Ok(attempts)
    }

    async fn by_binary(
        &self,
        binary_id: Uuid,
        limit: i64,
        skip: i64,
    ) -> AppResult<Vec<VerificationAttempt>> {
        let state = self.state.lock().await;
        let license_ids: Vec<Uuid> = state
            .licenses
            .values()
            .filter(|l| l.binary_id == binary_id)
            .map(|l| l.id)
            .collect();
        let mut attempts: Vec<VerificationAttempt> = state
            .attempts
            .iter()
            .filter(|a| license_ids.contains(&a.license_id))
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(attempts
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_by_binary(&self, binary_id: Uuid) -> AppResult<u64> {
        let state = self.state.lock().await;
        let license_ids: Vec<Uuid> = state
            .licenses
            .values()
            .filter(|l| l.binary_id == binary_id)
            .map(|l| l.id)
            .collect();
        Ok(state
            .attempts
            .iter()
            .filter(|a| license_ids.contains(&a.license_id))
            .count() as u64)
    }

    async fn since(&self, from: DateTime<Utc>) -> AppResult<Vec<VerificationAttempt>> {
        let state = self.state.lock().await;
        let mut attempts: Vec<VerificationAttempt> = state
            .attempts
            .iter()
            .filter(|a| a.timestamp >= from)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(attempts)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.state.lock().await.attempts.len() as u64)
    }
}

#[async_trait]
impl BinaryStore for MemoryStore {
    async fn insert(&self, binary: &Binary) -> AppResult<Binary> {
        let mut state = self.state.lock().await;
        state.binaries.insert(binary.id, binary.clone());
        Ok(binary.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Binary>> {
        Ok(self.state.lock().await.binaries.get(&id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<BinarySummary>> {
        let state = self.state.lock().await;
        let mut summaries: Vec<BinarySummary> = state
            .binaries
            .values()
            .map(|b| BinarySummary {
                id: b.id,
                name: b.name.clone(),
                original_size: b.original_size,
                wrapped_size: b.wrapped_size,
                license_count: state
                    .licenses
                    .values()
                    .filter(|l| l.binary_id == b.id)
                    .count() as i64,
                created_at: b.created_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.state.lock().await.binaries.len() as u64)
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert(&self, token: &DownloadToken) -> AppResult<DownloadToken> {
        let mut state = self.state.lock().await;
        state.tokens.insert(token.id, token.clone());
        Ok(token.clone())
    }

    async fn consume(
        &self,
        binary_id: Uuid,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DownloadToken>> {
        let mut state = self.state.lock().await;
        let found = state.tokens.values_mut().find(|t| {
            t.binary_id == binary_id
                && t.token == token
                && t.consumed_at.is_none()
                && t.expires_at >= now
        });
        Ok(found.map(|t| {
            t.consumed_at = Some(now);
            t.clone()
        }))
    }

    async fn delete_stale(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.tokens.len();
        state
            .tokens
            .retain(|_, t| t.consumed_at.is_none() && t.expires_at >= now);
        Ok((before - state.tokens.len()) as u64)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn insert(&self, snapshot: &TelemetrySnapshot) -> AppResult<()> {
        self.state.lock().await.snapshots.push(snapshot.clone());
        Ok(())
    }

    async fn latest(&self) -> AppResult<Option<TelemetrySnapshot>> {
        let state = self.state.lock().await;
        Ok(state
            .snapshots
            .iter()
            .max_by_key(|s| s.captured_at)
            .cloned())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn snapshot(
        &self,
        license_id: Uuid,
        fingerprint: &str,
    ) -> AppResult<Option<VerificationSnapshot>> {
        let state = self.state.lock().await;
        let Some(license) = state.licenses.get(&license_id).cloned() else {
            return Ok(None);
        };
        let machine = state
            .machines
            .get(&(license_id, fingerprint.to_string()))
            .cloned();
        Ok(Some(VerificationSnapshot { license, machine }))
    }

    async fn commit(&self, write: VerificationWriteSet) -> AppResult<()> {
        let mut state = self.state.lock().await;

        let license = state
            .licenses
            .get_mut(&write.license_id)
            .ok_or_else(|| AppError::not_found(format!("License {} not found", write.license_id)))?;
        if license.version != write.expected_version {
            return Err(AppError::conflict(format!(
                "License {} version moved past {}",
                write.license_id, write.expected_version
            )));
        }

        match write.counters {
            CounterUpdate::Success { count_execution } => {
                license.failed_attempts = 0;
                if count_execution {
                    license.executions_used += 1;
                }
            }
            CounterUpdate::Failure => {
                license.failed_attempts += 1;
            }
        }
        license.version += 1;
        license.updated_at = write.attempt.timestamp;

        if let Some(upsert) = &write.machine {
            let key = (upsert.license_id, upsert.machine_fingerprint.clone());
            state
                .machines
                .entry(key)
                .and_modify(|m| {
                    m.last_seen = upsert.seen_at;
                    m.last_ip = upsert.ip_address.clone();
                    m.total_checks += 1;
                })
                .or_insert_with(|| MachineInstance {
                    id: Uuid::new_v4(),
                    license_id: upsert.license_id,
                    machine_fingerprint: upsert.machine_fingerprint.clone(),
                    first_seen: upsert.seen_at,
                    last_seen: upsert.seen_at,
                    total_checks: 1,
                    last_ip: upsert.ip_address.clone(),
                });
        }

        state.attempts.push(VerificationAttempt {
            id: Uuid::new_v4(),
            timestamp: write.attempt.timestamp,
            license_id: write.attempt.license_id,
            machine_fingerprint: write.attempt.machine_fingerprint.clone(),
            ip_address: write.attempt.ip_address.clone(),
            success: write.attempt.success,
            error_message: write.attempt.error_message.clone(),
            within_grace_period: write.attempt.within_grace_period,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_entity::license::{KillMethod, LicenseType};

    fn binary() -> Binary {
        let now = Utc::now();
        Binary {
            id: Uuid::new_v4(),
            name: "app.exe".to_string(),
            original_size: 1024,
            wrapped_size: 2048,
            artifact_path: "app.bin".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn license(binary_id: Uuid) -> License {
        let now = Utc::now();
        License {
            id: Uuid::new_v4(),
            binary_id,
            license_type: LicenseType::Patchable,
            sync_mode: false,
            network_failure_kill_count: 5,
            grace_period_seconds: Some(3600),
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
    async fn test_commit_conflict_on_stale_version() {
        let store = MemoryStore::new();
        let bin = binary();
        BinaryStore::insert(&store, &bin).await.unwrap();
        let lic = license(bin.id);
        LicenseStore::insert(&store, &lic).await.unwrap();

        let now = Utc::now();
        let write = VerificationWriteSet {
            license_id: lic.id,
            expected_version: 99,
            machine: None,
            attempt: crate::stores::NewAttempt {
                license_id: lic.id,
                machine_fingerprint: "fp".to_string(),
                ip_address: None,
                timestamp: now,
                success: true,
                error_message: None,
                within_grace_period: true,
            },
            counters: CounterUpdate::Success {
                count_execution: true,
            },
        };
        let err = VerificationStore::commit(&store, write).await.unwrap_err();
        assert_eq!(err.kind, warden_core::error::ErrorKind::Conflict);
        // Nothing was applied.
        assert_eq!(AttemptStore::count(&store).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_token_single_use() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let bin = binary();
        let token = DownloadToken {
            id: Uuid::new_v4(),
            binary_id: bin.id,
            token: "abc".to_string(),
            expires_at: now + chrono::Duration::seconds(60),
            consumed_at: None,
            created_at: now,
        };
        TokenStore::insert(&store, &token).await.unwrap();

        assert!(store.consume(bin.id, "abc", now).await.unwrap().is_some());
        assert!(store.consume(bin.id, "abc", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_revoked_is_idempotent() {
        let store = MemoryStore::new();
        let bin = binary();
        BinaryStore::insert(&store, &bin).await.unwrap();
        let lic = license(bin.id);
        LicenseStore::insert(&store, &lic).await.unwrap();

        let now = Utc::now();
        let first = store.set_revoked(lic.id, true, now).await.unwrap();
        let second = store
            .set_revoked(lic.id, true, now + chrono::Duration::seconds(5))
            .await
            .unwrap();
        assert_eq!(first.revoked_at, second.revoked_at);
        assert_eq!(first.version, second.version);
    }
}
