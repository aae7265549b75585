//! Machine fingerprint validation.
//!
//! The fingerprint is the deployed binary's half of its capability
//! credential (the other half is the license id). A malformed
//! fingerprint is rejected before it reaches the engine and is never
//! logged as a verification attempt against any license.

use warden_core::{AppError, AppResult};

/// Minimum accepted fingerprint length.
const MIN_LEN: usize = 16;
/// Maximum accepted fingerprint length.
const MAX_LEN: usize = 128;

/// Validate a client-supplied machine fingerprint.
///
/// Accepts ASCII alphanumerics plus `-`, `_`, `:` and `.` — the
/// characters fingerprinting schemes (hashed hardware ids, UUIDs,
/// MAC-derived ids) actually produce.
pub fn validate(fingerprint: &str) -> AppResult<()> {
    if fingerprint.len() < MIN_LEN || fingerprint.len() > MAX_LEN {
        return Err(AppError::validation(format!(
            "Machine fingerprint must be {MIN_LEN}-{MAX_LEN} characters"
        )));
    }
    if !fingerprint
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
    {
        return Err(AppError::validation(
            "Machine fingerprint contains invalid characters",
        ));
    }
    Ok(())
}
