//! Verification request input contract.

use uuid::Uuid;

use warden_entity::verification::CheckKind;

/// One license check from a deployed binary.
///
/// These four fields are the entire untrusted input surface of the
/// engine: nothing else a client sends can influence the decision.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    /// License the caller claims to hold.
    pub license_id: Uuid,
    /// Stable identifier of the calling installation.
    pub machine_fingerprint: String,
    /// Caller IP as observed by the server.
    pub ip_address: Option<String>,
    /// Whether this contact marks a new execution or a heartbeat.
    pub kind: CheckKind,
}
