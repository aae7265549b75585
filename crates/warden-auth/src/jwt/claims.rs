//! JWT claims structure for operator bearer tokens.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::OperatorRole;

/// Claims payload embedded in every operator token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorClaims {
    /// Subject — the operator's name.
    pub sub: String,
    /// Operator role at issuance time.
    pub role: OperatorRole,
    /// Issuer.
    pub iss: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Token ID.
    pub jti: Uuid,
}

impl OperatorClaims {
    /// Checks whether this token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}
