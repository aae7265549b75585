//! Computed license lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a license at a point in time.
///
/// This is a tagged variant computed on read from the stored fields,
/// never a persisted column, so it cannot drift out of sync with the
/// underlying row. Ordering of the variants encodes the tie-break:
/// revoked wins over expired, expired over exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseState {
    /// Revoked by an operator; KILL until re-enabled.
    Revoked,
    /// Past its expiry timestamp.
    Expired,
    /// Execution budget consumed.
    Exhausted,
    /// Healthy and verifiable.
    Active,
}

impl LicenseState {
    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revoked => "revoked",
            Self::Expired => "expired",
            Self::Exhausted => "exhausted",
            Self::Active => "active",
        }
    }
}

impl fmt::Display for LicenseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
