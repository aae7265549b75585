//! Client-side enforcement action taken on a KILL verdict.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a protected binary does when the server tells it to die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "kill_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum KillMethod {
    /// Terminate the process and stop contacting the server.
    Stop,
    /// Terminate and delete the binary's own file.
    Delete,
    /// Terminate and overwrite-then-delete the file (multi-pass).
    Shred,
}

impl KillMethod {
    /// Return the method as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Delete => "delete",
            Self::Shred => "shred",
        }
    }
}

impl fmt::Display for KillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for KillMethod {
    type Err = warden_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stop" => Ok(Self::Stop),
            "delete" => Ok(Self::Delete),
            "shred" => Ok(Self::Shred),
            _ => Err(warden_core::AppError::validation(format!(
                "Invalid kill method: '{s}'. Expected one of: stop, delete, shred"
            ))),
        }
    }
}
