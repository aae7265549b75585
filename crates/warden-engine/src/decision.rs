//! Verdict types returned by the verification engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_entity::license::{KillMethod, License};

/// Why a verification was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// No such license exists.
    UnknownLicense,
    /// The license was revoked by an operator.
    Revoked,
    /// The license is past its expiry timestamp.
    Expired,
    /// The execution budget is consumed.
    ExecutionLimit,
    /// The machine reappeared after its grace period lapsed and the
    /// deployment is configured to enforce the gap.
    GraceExceeded,
}

impl RejectionReason {
    /// Human-readable message recorded on the attempt log.
    pub fn message(&self) -> &'static str {
        match self {
            Self::UnknownLicense => "Unknown license",
            Self::Revoked => "License revoked",
            Self::Expired => "License expired",
            Self::ExecutionLimit => "Execution limit reached",
            Self::GraceExceeded => "Grace period exceeded",
        }
    }
}

/// Settings echoed to the client on ALLOW, supporting live
/// reconfiguration of patchable licenses without redistribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowSettings {
    /// Interval the client should check in at.
    pub check_interval_ms: i64,
    /// Enforcement action the client must take on a future KILL.
    pub kill_method: KillMethod,
    /// Execution budget, if capped.
    pub max_executions: Option<i64>,
    /// Expiry timestamp, if set.
    pub expires_at: Option<DateTime<Utc>>,
    /// Executions consumed including this check.
    pub executions_used: i64,
}

impl AllowSettings {
    /// Build the settings echo from a license row image.
    pub fn from_license(license: &License) -> Self {
        Self {
            check_interval_ms: license.check_interval_ms,
            kill_method: license.kill_method,
            max_executions: license.max_executions,
            expires_at: license.expires_at,
            executions_used: license.executions_used,
        }
    }
}

/// The engine's answer to one verification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum Verdict {
    /// The binary may continue running.
    Allow {
        /// Current patchable settings for the client to adopt.
        settings: AllowSettings,
    },
    /// The binary should stop contacting the server. Returned when no
    /// license context exists to select a kill method (unknown license).
    Deny {
        /// Why the request was denied.
        reason: RejectionReason,
    },
    /// The binary must execute the given kill method.
    Kill {
        /// Enforcement action to take.
        method: KillMethod,
        /// Why the license is dead.
        reason: RejectionReason,
    },
}

impl Verdict {
    /// Whether this verdict allows the binary to keep running.
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}
