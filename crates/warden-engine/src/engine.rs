//! The verification decision protocol.
//!
//! `evaluate` is a pure function from one consistent snapshot to a
//! verdict plus the write-set that records it; `VerificationEngine`
//! wraps it in an optimistic read-decide-write loop against the store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use warden_core::config::enforcement::EnforcementConfig;
use warden_core::error::ErrorKind;
use warden_core::{AppError, AppResult};
use warden_database::stores::{
    CounterUpdate, MachineUpsert, NewAttempt, VerificationStore, VerificationWriteSet,
};
use warden_entity::license::License;
use warden_entity::machine::MachineInstance;
use warden_entity::verification::CheckKind;

use crate::decision::{AllowSettings, RejectionReason, Verdict};
use crate::request::VerificationRequest;

/// Stateless request handler implementing the license decision protocol.
#[derive(Clone)]
pub struct VerificationEngine {
    store: Arc<dyn VerificationStore>,
    config: EnforcementConfig,
}

impl std::fmt::Debug for VerificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationEngine")
            .field("config", &self.config)
            .finish()
    }
}

impl VerificationEngine {
    /// Create an engine over the given store.
    pub fn new(store: Arc<dyn VerificationStore>, config: EnforcementConfig) -> Self {
        Self { store, config }
    }

    /// Answer one verification request, advancing all affected state
    /// atomically.
    ///
    /// Store failures propagate as retryable errors and never produce an
    /// ALLOW; a commit conflict (another request for the same pair won
    /// the race) retries the whole read-decide-write cycle so neither
    /// side's effect is dropped.
    pub async fn verify(&self, request: &VerificationRequest) -> AppResult<Verdict> {
        for round in 0..=self.config.max_commit_retries {
            let now = Utc::now();
            let snapshot = self
                .store
                .snapshot(request.license_id, &request.machine_fingerprint)
                .await?;

            let Some(snapshot) = snapshot else {
                // No license row exists, so there is nothing to attach an
                // attempt to; the rejection is visible in traces only.
                warn!(
                    license_id = %request.license_id,
                    fingerprint = %request.machine_fingerprint,
                    "Verification against unknown license"
                );
                return Ok(Verdict::Deny {
                    reason: RejectionReason::UnknownLicense,
                });
            };

            let (verdict, write) = evaluate(
                &snapshot.license,
                snapshot.machine.as_ref(),
                request,
                self.config.gate_on_grace,
                now,
            );

            // Server-side, the offline kill count is a telemetry threshold:
            // a machine tripping it is flagged as abusive or flaky, never
            // killed for it alone.
            let flagged = matches!(write.counters, CounterUpdate::Failure)
                && snapshot.license.failed_attempts + 1
                    >= snapshot.license.network_failure_kill_count;

            match self.store.commit(write).await {
                Ok(()) => {
                    if flagged {
                        warn!(
                            license_id = %request.license_id,
                            fingerprint = %request.machine_fingerprint,
                            failed_attempts = snapshot.license.failed_attempts + 1,
                            threshold = snapshot.license.network_failure_kill_count,
                            "Consecutive failure threshold reached"
                        );
                    }
                    debug!(
                        license_id = %request.license_id,
                        fingerprint = %request.machine_fingerprint,
                        allow = verdict.is_allow(),
                        "Verification decided"
                    );
                    return Ok(verdict);
                }
                Err(e) if e.kind == ErrorKind::Conflict => {
                    debug!(
                        license_id = %request.license_id,
                        round,
                        "Verification commit conflict, retrying"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::conflict(format!(
            "Verification for license {} could not commit after {} retries",
            request.license_id, self.config.max_commit_retries
        )))
    }
}

/// Decide one request against a consistent snapshot.
///
/// Gate order is fixed: revoked, then expired, then execution limit —
/// revocation is the strongest signal and wins even when the counters
/// look healthy. Returns the verdict together with the write-set that
/// must commit for the verdict to stand.
pub fn evaluate(
    license: &License,
    machine: Option<&MachineInstance>,
    request: &VerificationRequest,
    gate_on_grace: bool,
    now: DateTime<Utc>,
) -> (Verdict, VerificationWriteSet) {
    let within_grace = within_grace_period(license, machine, now);

    let rejection = if license.revoked {
        Some(RejectionReason::Revoked)
    } else if license.is_expired(now) {
        Some(RejectionReason::Expired)
    } else if license.is_exhausted() {
        Some(RejectionReason::ExecutionLimit)
    } else if gate_on_grace && !within_grace {
        Some(RejectionReason::GraceExceeded)
    } else {
        None
    };

    if let Some(reason) = rejection {
        let verdict = Verdict::Kill {
            method: license.kill_method,
            reason,
        };
        let write = VerificationWriteSet {
            license_id: license.id,
            expected_version: license.version,
            machine: None,
            attempt: NewAttempt {
                license_id: license.id,
                machine_fingerprint: request.machine_fingerprint.clone(),
                ip_address: request.ip_address.clone(),
                timestamp: now,
                success: false,
                error_message: Some(reason.message().to_string()),
                within_grace_period: within_grace,
            },
            counters: CounterUpdate::Failure,
        };
        return (verdict, write);
    }

    // Sync-mode licenses make exactly one check per run, so every contact
    // is an execution; async mode consumes the budget only on starts.
    let count_execution = license.sync_mode || request.kind == CheckKind::Start;

    let mut settings = AllowSettings::from_license(license);
    if count_execution {
        settings.executions_used += 1;
    }

    let verdict = Verdict::Allow { settings };
    let write = VerificationWriteSet {
        license_id: license.id,
        expected_version: license.version,
        machine: Some(MachineUpsert {
            license_id: license.id,
            machine_fingerprint: request.machine_fingerprint.clone(),
            seen_at: now,
            ip_address: request.ip_address.clone(),
        }),
        attempt: NewAttempt {
            license_id: license.id,
            machine_fingerprint: request.machine_fingerprint.clone(),
            ip_address: request.ip_address.clone(),
            timestamp: now,
            success: true,
            error_message: None,
            within_grace_period: within_grace,
        },
        counters: CounterUpdate::Success { count_execution },
    };
    (verdict, write)
}

/// Whether this machine reappeared inside its grace period.
///
/// First contact (no machine row yet) and unlimited grace both count as
/// within grace; the flag is an audit marker on the attempt, not a gate,
/// unless the deployment opts into `gate_on_grace`.
fn within_grace_period(
    license: &License,
    machine: Option<&MachineInstance>,
    now: DateTime<Utc>,
) -> bool {
    let Some(machine) = machine else {
        return true;
    };
    let Some(grace) = license.grace_period_seconds else {
        return true;
    };
    now - machine.last_seen <= Duration::seconds(grace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use warden_database::memory::MemoryStore;
    use warden_database::stores::{BinaryStore, LicenseStore, MachineStore};
    use warden_entity::binary::Binary;
    use warden_entity::license::{KillMethod, LicenseType};

    fn test_config() -> EnforcementConfig {
        EnforcementConfig {
            // Generous retry budget so contention tests never give up.
            max_commit_retries: 32,
            ..EnforcementConfig::default()
        }
    }

    async fn seed(store: &MemoryStore, license: &License) {
        let now = Utc::now();
        let binary = Binary {
            id: license.binary_id,
            name: "app.exe".to_string(),
            original_size: 1024,
            wrapped_size: 4096,
            artifact_path: "app.bin".to_string(),
            created_at: now,
            updated_at: now,
        };
        BinaryStore::insert(store, &binary).await.unwrap();
        LicenseStore::insert(store, license).await.unwrap();
    }

    fn base_license() -> License {
        let now = Utc::now();
        License {
            id: Uuid::new_v4(),
            binary_id: Uuid::new_v4(),
            license_type: LicenseType::Patchable,
            sync_mode: false,
            network_failure_kill_count: 5,
            grace_period_seconds: Some(3600),
            check_interval_ms: 60_000,
            kill_method: KillMethod::Shred,
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

    fn request(license_id: Uuid, kind: CheckKind) -> VerificationRequest {
        VerificationRequest {
            license_id,
            machine_fingerprint: "machine-fingerprint-01".to_string(),
            ip_address: Some("203.0.113.7".to_string()),
            kind,
        }
    }

    fn engine(store: &MemoryStore) -> VerificationEngine {
        VerificationEngine::new(Arc::new(store.clone()), test_config())
    }

    #[tokio::test]
    async fn test_first_verification_allows_and_counts() {
        let store = MemoryStore::new();
        let license = base_license();
        seed(&store, &license).await;
        let engine = engine(&store);

        let verdict = engine
            .verify(&request(license.id, CheckKind::Start))
            .await
            .unwrap();
        match verdict {
            Verdict::Allow { settings } => {
                assert_eq!(settings.executions_used, 1);
                assert_eq!(settings.check_interval_ms, 60_000);
                assert_eq!(settings.kill_method, KillMethod::Shred);
            }
            other => panic!("expected allow, got {other:?}"),
        }

        let stored = LicenseStore::find_by_id(&store, license.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.executions_used, 1);
        assert_eq!(stored.failed_attempts, 0);

        let machine = store
            .find(license.id, "machine-fingerprint-01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(machine.total_checks, 1);
        assert_eq!(machine.last_ip.as_deref(), Some("203.0.113.7"));
    }

    #[tokio::test]
    async fn test_heartbeat_does_not_consume_execution() {
        let store = MemoryStore::new();
        let license = base_license();
        seed(&store, &license).await;
        let engine = engine(&store);

        engine
            .verify(&request(license.id, CheckKind::Start))
            .await
            .unwrap();
        engine
            .verify(&request(license.id, CheckKind::Heartbeat))
            .await
            .unwrap();
        engine
            .verify(&request(license.id, CheckKind::Heartbeat))
            .await
            .unwrap();

        let stored = LicenseStore::find_by_id(&store, license.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.executions_used, 1);
        let machine = store
            .find(license.id, "machine-fingerprint-01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(machine.total_checks, 3);
    }

    #[tokio::test]
    async fn test_sync_mode_counts_every_contact() {
        let store = MemoryStore::new();
        let mut license = base_license();
        license.sync_mode = true;
        seed(&store, &license).await;
        let engine = engine(&store);

        engine
            .verify(&request(license.id, CheckKind::Heartbeat))
            .await
            .unwrap();
        engine
            .verify(&request(license.id, CheckKind::Heartbeat))
            .await
            .unwrap();

        let stored = LicenseStore::find_by_id(&store, license.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.executions_used, 2);
    }

    #[tokio::test]
    async fn test_unknown_license_denies() {
        let store = MemoryStore::new();
        let engine = engine(&store);

        let verdict = engine
            .verify(&request(Uuid::new_v4(), CheckKind::Start))
            .await
            .unwrap();
        assert!(matches!(
            verdict,
            Verdict::Deny {
                reason: RejectionReason::UnknownLicense
            }
        ));
    }

    #[tokio::test]
    async fn test_revoked_kills_and_increments_failures() {
        let store = MemoryStore::new();
        let mut license = base_license();
        license.revoked = true;
        license.revoked_at = Some(Utc::now());
        seed(&store, &license).await;
        let engine = engine(&store);

        let verdict = engine
            .verify(&request(license.id, CheckKind::Start))
            .await
            .unwrap();
        assert!(matches!(
            verdict,
            Verdict::Kill {
                method: KillMethod::Shred,
                reason: RejectionReason::Revoked
            }
        ));

        let stored = LicenseStore::find_by_id(&store, license.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.failed_attempts, 1);
        assert_eq!(stored.executions_used, 0);
        // Rejections do not create or advance machine instances.
        assert!(
            store
                .find(license.id, "machine-fingerprint-01")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_revocation_outranks_expiry_and_limit() {
        let now = Utc::now();
        let mut license = base_license();
        license.revoked = true;
        license.expires_at = Some(now - Duration::hours(1));
        license.max_executions = Some(1);
        license.executions_used = 5;

        let req = request(license.id, CheckKind::Start);
        let (verdict, _) = evaluate(&license, None, &req, false, now);
        assert!(matches!(
            verdict,
            Verdict::Kill {
                reason: RejectionReason::Revoked,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let now = Utc::now();
        let mut license = base_license();
        let req = request(license.id, CheckKind::Start);

        license.expires_at = Some(now + Duration::seconds(1));
        let (verdict, _) = evaluate(&license, None, &req, false, now);
        assert!(verdict.is_allow());

        license.expires_at = Some(now - Duration::seconds(1));
        let (verdict, _) = evaluate(&license, None, &req, false, now);
        assert!(matches!(
            verdict,
            Verdict::Kill {
                reason: RejectionReason::Expired,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_execution_limit_kills_without_overshoot() {
        let store = MemoryStore::new();
        let mut license = base_license();
        license.max_executions = Some(3);
        seed(&store, &license).await;
        let engine = engine(&store);

        for _ in 0..3 {
            let verdict = engine
                .verify(&request(license.id, CheckKind::Start))
                .await
                .unwrap();
            assert!(verdict.is_allow());
        }

        let verdict = engine
            .verify(&request(license.id, CheckKind::Start))
            .await
            .unwrap();
        assert!(matches!(
            verdict,
            Verdict::Kill {
                reason: RejectionReason::ExecutionLimit,
                ..
            }
        ));

        let stored = LicenseStore::find_by_id(&store, license.id)
            .await
            .unwrap()
            .unwrap();
        // The counter never exceeds the cap.
        assert_eq!(stored.executions_used, 3);
    }

    #[tokio::test]
    async fn test_revoke_reenable_scenario() {
        let store = MemoryStore::new();
        let license = base_license();
        seed(&store, &license).await;
        let engine = engine(&store);
        let req = request(license.id, CheckKind::Start);

        assert!(engine.verify(&req).await.unwrap().is_allow());

        store
            .set_revoked(license.id, true, Utc::now())
            .await
            .unwrap();
        assert!(matches!(
            engine.verify(&req).await.unwrap(),
            Verdict::Kill {
                reason: RejectionReason::Revoked,
                ..
            }
        ));

        store
            .set_revoked(license.id, false, Utc::now())
            .await
            .unwrap();
        assert!(engine.verify(&req).await.unwrap().is_allow());

        let stored = LicenseStore::find_by_id(&store, license.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.executions_used, 2);
        // Success resets the consecutive-failure counter.
        assert_eq!(stored.failed_attempts, 0);

        let machine = store
            .find(license.id, "machine-fingerprint-01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(machine.total_checks, 2);
    }

    #[tokio::test]
    async fn test_grace_overrun_is_audited_not_fatal() {
        let now = Utc::now();
        let license = base_license();
        let machine = MachineInstance {
            id: Uuid::new_v4(),
            license_id: license.id,
            machine_fingerprint: "machine-fingerprint-01".to_string(),
            first_seen: now - Duration::hours(10),
            last_seen: now - Duration::hours(10),
            total_checks: 4,
            last_ip: None,
        };
        let req = request(license.id, CheckKind::Heartbeat);

        let (verdict, write) = evaluate(&license, Some(&machine), &req, false, now);
        assert!(verdict.is_allow());
        assert!(!write.attempt.within_grace_period);

        // The same gap kills when the deployment opts into gating.
        let (verdict, _) = evaluate(&license, Some(&machine), &req, true, now);
        assert!(matches!(
            verdict,
            Verdict::Kill {
                reason: RejectionReason::GraceExceeded,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_concurrent_checks_lose_nothing() {
        let store = MemoryStore::new();
        let license = base_license();
        seed(&store, &license).await;
        let engine = engine(&store);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let engine = engine.clone();
            let req = request(license.id, CheckKind::Start);
            handles.push(tokio::spawn(async move { engine.verify(&req).await }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_allow());
        }

        let stored = LicenseStore::find_by_id(&store, license.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.executions_used, 10);
        let machine = store
            .find(license.id, "machine-fingerprint-01")
            .await
            .unwrap()
            .unwrap();
        // Exactly one increment per request: no more, no less.
        assert_eq!(machine.total_checks, 10);
    }
}
