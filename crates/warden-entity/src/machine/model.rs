//! Machine instance entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::license::License;

use super::status::MachineStatus;

/// One installation of a protected binary, keyed by
/// `(license_id, machine_fingerprint)`.
///
/// Created on the first verification attempt from a fingerprint and
/// pruned only together with its license.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MachineInstance {
    /// Unique instance identifier.
    pub id: Uuid,
    /// License this machine verifies against.
    pub license_id: Uuid,
    /// Stable identifier for the installation/host.
    pub machine_fingerprint: String,
    /// First verification from this fingerprint.
    pub first_seen: DateTime<Utc>,
    /// Most recent verification from this fingerprint.
    pub last_seen: DateTime<Utc>,
    /// Total verification contacts received.
    pub total_checks: i64,
    /// IP address of the most recent contact.
    pub last_ip: Option<String>,
}

impl MachineInstance {
    /// Compute this machine's liveness against its license at `now`.
    ///
    /// Sync-mode licenses have no periodic interval, so liveness cannot
    /// be derived from `last_seen`; they report `Unknown`. An unlimited
    /// grace period means the machine never goes inactive.
    pub fn status(&self, license: &License, now: DateTime<Utc>) -> MachineStatus {
        if license.sync_mode {
            return MachineStatus::Unknown;
        }
        match license.offline_window_seconds() {
            Some(window) => {
                if now - self.last_seen <= Duration::seconds(window) {
                    MachineStatus::Active
                } else {
                    MachineStatus::Inactive
                }
            }
            None => MachineStatus::Active,
        }
    }
}
