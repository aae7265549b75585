//! Verification engine policy configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the verification decision protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcementConfig {
    /// Treat a grace-period overrun as a KILL instead of an audit flag.
    ///
    /// The default models the gap as advisory: the overrun is recorded on
    /// the attempt (`within_grace_period = false`) and the request still
    /// proceeds through the normal gates.
    #[serde(default)]
    pub gate_on_grace: bool,
    /// Maximum optimistic-commit retries for one verification request.
    #[serde(default = "default_commit_retries")]
    pub max_commit_retries: u32,
    /// Per-IP request budget on the public verify endpoint, per minute.
    #[serde(default = "default_verify_rate")]
    pub verify_rate_per_minute: u32,
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            gate_on_grace: false,
            max_commit_retries: default_commit_retries(),
            verify_rate_per_minute: default_verify_rate(),
        }
    }
}

fn default_commit_retries() -> u32 {
    3
}

fn default_verify_rate() -> u32 {
    120
}
