//! Operator token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use warden_core::config::auth::AuthConfig;
use warden_core::error::AppError;

use super::claims::OperatorClaims;

/// Validates operator bearer tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder").finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.clone()]);
        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decode and validate a bearer token, returning its claims.
    pub fn decode(&self, token: &str) -> Result<OperatorClaims, AppError> {
        decode::<OperatorClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::authentication(format!("Invalid operator token: {e}")))
    }
}
