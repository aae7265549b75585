//! Execution-vs-heartbeat classification of a verification request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the client is reporting with this check.
///
/// `Start` marks a new process lifetime and consumes an execution from
/// the license budget; `Heartbeat` is a periodic ping from an already
/// counted process. Sync-mode licenses perform a single startup check,
/// so every contact is treated as `Start` regardless of this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// New process lifetime; counts against `max_executions`.
    #[default]
    Start,
    /// Periodic ping; does not consume an execution.
    Heartbeat,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Heartbeat => write!(f, "heartbeat"),
        }
    }
}
