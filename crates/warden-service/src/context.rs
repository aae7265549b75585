//! Per-request operator context.

use warden_auth::OperatorRole;
use warden_core::{AppError, AppResult};

/// Authenticated operator context threaded through every dashboard
/// service call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Operator name from the token subject.
    pub operator: String,
    /// Role at token issuance.
    pub role: OperatorRole,
    /// Caller IP as observed by the server.
    pub ip_address: Option<String>,
}

impl RequestContext {
    /// Create a new request context.
    pub fn new(operator: String, role: OperatorRole, ip_address: Option<String>) -> Self {
        Self {
            operator,
            role,
            ip_address,
        }
    }

    /// Require at least the given role.
    pub fn require(&self, role: OperatorRole) -> AppResult<()> {
        if self.role.has_at_least(&role) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Requires {role} role or above"
            )))
        }
    }
}
