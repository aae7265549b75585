//! Operator token configuration.

use serde::{Deserialize, Serialize};

/// Settings for dashboard bearer-token auth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing operator tokens.
    pub jwt_secret: String,
    /// Token issuer claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Operator token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
}

fn default_issuer() -> String {
    "warden".to_string()
}

fn default_token_ttl() -> u64 {
    24 * 3600
}
