//! License mutability class.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mutability class of a license, fixed at creation.
///
/// Read-only licenses reject every post-creation change to their
/// enforcement fields; revocation is a separate lifecycle axis and is
/// allowed for both classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "license_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    /// Enforcement fields may be changed after creation.
    Patchable,
    /// Enforcement fields are frozen at creation.
    Readonly,
}

impl LicenseType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patchable => "patchable",
            Self::Readonly => "readonly",
        }
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LicenseType {
    type Err = warden_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "patchable" => Ok(Self::Patchable),
            "readonly" => Ok(Self::Readonly),
            _ => Err(warden_core::AppError::validation(format!(
                "Invalid license type: '{s}'. Expected one of: patchable, readonly"
            ))),
        }
    }
}
