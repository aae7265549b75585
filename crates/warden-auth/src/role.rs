//! Operator role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use warden_core::AppError;

/// Roles available to dashboard operators.
///
/// Roles are ordered by privilege level: Admin > Operator > Viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorRole {
    /// Full control, including binary and license deletion.
    Admin,
    /// Can create, patch, revoke, and re-enable licenses.
    Operator,
    /// Read-only dashboard access.
    Viewer,
}

impl OperatorRole {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Admin => 3,
            Self::Operator => 2,
            Self::Viewer => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &OperatorRole) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Operator => "operator",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for OperatorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OperatorRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "operator" => Ok(Self::Operator),
            "viewer" => Ok(Self::Viewer),
            _ => Err(AppError::validation(format!(
                "Invalid operator role: '{s}'. Expected one of: admin, operator, viewer"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_ordering() {
        assert!(OperatorRole::Admin.has_at_least(&OperatorRole::Viewer));
        assert!(OperatorRole::Operator.has_at_least(&OperatorRole::Operator));
        assert!(!OperatorRole::Viewer.has_at_least(&OperatorRole::Operator));
    }
}
