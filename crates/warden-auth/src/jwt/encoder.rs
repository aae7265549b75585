//! Operator token creation with configurable signing and TTL.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use warden_core::config::auth::AuthConfig;
use warden_core::error::AppError;

use super::claims::OperatorClaims;
use crate::role::OperatorRole;

/// Creates signed operator bearer tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    issuer: String,
    ttl_seconds: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            ttl_seconds: config.token_ttl_seconds as i64,
        }
    }

    /// Generates a signed token for the given operator.
    pub fn generate(
        &self,
        subject: &str,
        role: OperatorRole,
    ) -> Result<(String, chrono::DateTime<Utc>), AppError> {
        let now = Utc::now();
        let exp = now + chrono::Duration::seconds(self.ttl_seconds);

        let claims = OperatorClaims {
            sub: subject.to_string(),
            role,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode operator token: {e}")))?;

        Ok((token, exp))
    }
}
