//! Computed machine liveness status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Liveness of a machine instance, derived at read time from `last_seen`
/// against the license's check interval and grace period. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    /// Checked in within one interval plus grace.
    Active,
    /// Silent for longer than the offline window.
    Inactive,
    /// No interval applicable (sync-mode license).
    Unknown,
}

impl MachineStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
