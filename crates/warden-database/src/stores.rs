//! Store traits for the Warden persistence layer.
//!
//! Higher layers (engine, services, telemetry) program against these
//! traits only. Two implementations exist: the PostgreSQL repositories
//! in [`crate::repositories`] and the in-memory store in
//! [`crate::memory`] used by tests and single-node development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
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

/// Whitelisted sort keys for license listings.
///
/// Parsed from the `sort_by` query parameter; anything outside the
/// whitelist is a validation error, which keeps user input out of SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LicenseSortKey {
    /// Sort by creation time.
    #[default]
    CreatedAt,
    /// Sort by last update time.
    UpdatedAt,
    /// Sort by expiry timestamp.
    ExpiresAt,
    /// Sort by executions consumed.
    ExecutionsUsed,
}

impl LicenseSortKey {
    /// Parse a `sort_by` query value.
    pub fn parse(s: &str) -> AppResult<Self> {
        match s {
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            "expires_at" => Ok(Self::ExpiresAt),
            "executions_used" => Ok(Self::ExecutionsUsed),
            _ => Err(AppError::validation(format!(
                "Invalid sort_by: '{s}'. Expected one of: created_at, updated_at, expires_at, executions_used"
            ))),
        }
    }

    /// The column this key sorts on.
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::ExpiresAt => "expires_at",
            Self::ExecutionsUsed => "executions_used",
        }
    }
}

/// Store for license rows.
#[async_trait]
pub trait LicenseStore: Send + Sync + 'static {
    /// Persist a fully constructed license row.
    async fn insert(&self, license: &License) -> AppResult<License>;

    /// Find a license by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<License>>;

    /// List every license attached to a binary.
    async fn find_by_binary(&self, binary_id: Uuid) -> AppResult<Vec<License>>;

    /// List licenses with pagination and sorting.
    async fn find_all(
        &self,
        page: &PageRequest,
        sort_by: LicenseSortKey,
        order: SortOrder,
    ) -> AppResult<PageResponse<License>>;

    /// Fetch every license (telemetry partitioning).
    async fn list_all(&self) -> AppResult<Vec<License>>;

    /// Persist a patched row image, guarded by the version the patch was
    /// computed against. Fails with a conflict when the row moved.
    async fn update_guarded(&self, updated: &License, expected_version: i64) -> AppResult<License>;

    /// Set the revoked flag. Idempotent: revoking an already revoked
    /// license (or re-enabling an active one) is a no-op success and
    /// keeps the original `revoked_at`.
    async fn set_revoked(&self, id: Uuid, revoked: bool, now: DateTime<Utc>) -> AppResult<License>;

    /// Hard-delete a license, cascading machine instances and attempts.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Count all licenses.
    async fn count(&self) -> AppResult<u64>;
}

/// Store for machine instance rows.
#[async_trait]
pub trait MachineStore: Send + Sync + 'static {
    /// Find a machine by its (license, fingerprint) key.
    async fn find(&self, license_id: Uuid, fingerprint: &str)
    -> AppResult<Option<MachineInstance>>;

    /// List all machines for a license.
    async fn find_by_license(&self, license_id: Uuid) -> AppResult<Vec<MachineInstance>>;

    /// Count all machine instances.
    async fn count(&self) -> AppResult<u64>;
}

/// Store for the append-only verification attempt log.
#[async_trait]
pub trait AttemptStore: Send + Sync + 'static {
    /// Most recent attempts for a license, newest first.
    async fn recent_by_license(
        &self,
        license_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<VerificationAttempt>>;

    /// Attempts for all licenses of a binary, newest first, paginated by
    /// limit/skip.
    async fn by_binary(
        &self,
        binary_id: Uuid,
        limit: i64,
        skip: i64,
    ) -> AppResult<Vec<VerificationAttempt>>;

    /// Count attempts for all licenses of a binary.
    async fn count_by_binary(&self, binary_id: Uuid) -> AppResult<u64>;

    /// All attempts with `timestamp >= from`, oldest first.
    async fn since(&self, from: DateTime<Utc>) -> AppResult<Vec<VerificationAttempt>>;

    /// Count all attempts.
    async fn count(&self) -> AppResult<u64>;
}

/// Store for protected binary rows.
#[async_trait]
pub trait BinaryStore: Send + Sync + 'static {
    /// Persist a new binary row.
    async fn insert(&self, binary: &Binary) -> AppResult<Binary>;

    /// Find a binary by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Binary>>;

    /// List all binaries with their derived license counts.
    async fn list(&self) -> AppResult<Vec<BinarySummary>>;

    /// Count all binaries.
    async fn count(&self) -> AppResult<u64>;
}

/// Store for one-time download tokens.
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    /// Persist a freshly issued token.
    async fn insert(&self, token: &DownloadToken) -> AppResult<DownloadToken>;

    /// Atomically redeem a token: marks it consumed and returns it, or
    /// returns None when it is unknown, expired, or already consumed.
    async fn consume(
        &self,
        binary_id: Uuid,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DownloadToken>>;

    /// Delete expired and consumed tokens; returns how many were removed.
    async fn delete_stale(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Store for persisted telemetry snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
    /// Persist a snapshot.
    async fn insert(&self, snapshot: &TelemetrySnapshot) -> AppResult<()>;

    /// The most recently captured snapshot, if any.
    async fn latest(&self) -> AppResult<Option<TelemetrySnapshot>>;
}

/// Liveness probe for the backing store.
#[async_trait]
pub trait StoreHealth: Send + Sync + 'static {
    /// Whether the store answers queries.
    async fn health_check(&self) -> AppResult<bool>;
}

// ── Verification engine seam ─────────────────────────────────────────

/// Consistent read of the rows one verification request decides over.
#[derive(Debug, Clone)]
pub struct VerificationSnapshot {
    /// The license row as of the read.
    pub license: License,
    /// The machine row for this fingerprint, if it exists yet.
    pub machine: Option<MachineInstance>,
}

/// Upsert data for the machine row on an allowed verification.
#[derive(Debug, Clone)]
pub struct MachineUpsert {
    /// License key part.
    pub license_id: Uuid,
    /// Fingerprint key part.
    pub machine_fingerprint: String,
    /// Contact time; becomes `first_seen` on insert.
    pub seen_at: DateTime<Utc>,
    /// Caller IP.
    pub ip_address: Option<String>,
}

/// Attempt row to append with the write-set.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    /// License the check was made against.
    pub license_id: Uuid,
    /// Fingerprint of the calling machine.
    pub machine_fingerprint: String,
    /// Caller IP.
    pub ip_address: Option<String>,
    /// Evaluation time.
    pub timestamp: DateTime<Utc>,
    /// Whether the verification was allowed.
    pub success: bool,
    /// Rejection reason for failed attempts.
    pub error_message: Option<String>,
    /// Grace audit flag.
    pub within_grace_period: bool,
}

/// License counter adjustment committed with the write-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterUpdate {
    /// Allowed: reset `failed_attempts`; consume an execution when the
    /// check counts as one.
    Success {
        /// Whether `executions_used` is incremented.
        count_execution: bool,
    },
    /// Rejected: bump `failed_attempts`.
    Failure,
}

/// The atomic write-set of one verification request.
///
/// Either every part commits or none does; a version mismatch on the
/// license row aborts the whole set with a conflict.
#[derive(Debug, Clone)]
pub struct VerificationWriteSet {
    /// License row being advanced.
    pub license_id: Uuid,
    /// Version the decision was computed against.
    pub expected_version: i64,
    /// Machine upsert (allowed verifications only).
    pub machine: Option<MachineUpsert>,
    /// Attempt to append.
    pub attempt: NewAttempt,
    /// Counter adjustment.
    pub counters: CounterUpdate,
}

/// Transactional seam used by the verification engine.
///
/// `snapshot` and `commit` together form one optimistic
/// read-decide-write cycle per `(license, fingerprint)` pair; the engine
/// retries the cycle on commit conflicts.
#[async_trait]
pub trait VerificationStore: Send + Sync + 'static {
    /// Read the license and machine rows for one request.
    async fn snapshot(
        &self,
        license_id: Uuid,
        fingerprint: &str,
    ) -> AppResult<Option<VerificationSnapshot>>;

    /// Atomically commit the write-set, or fail with
    /// [`warden_core::error::ErrorKind::Conflict`] when the license
    /// version moved since the snapshot.
    async fn commit(&self, write: VerificationWriteSet) -> AppResult<()>;
}
