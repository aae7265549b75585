//! # warden-engine
//!
//! The verification engine: given a license id, a machine fingerprint,
//! and the caller's IP, decide ALLOW / DENY / KILL and advance all
//! affected state atomically. One request is one optimistic
//! read-decide-write cycle against the [`warden_database::stores::VerificationStore`]
//! seam; conflicting cycles for the same (license, fingerprint) pair
//! retry, cycles for different pairs never contend.

pub mod decision;
pub mod engine;
pub mod request;

pub use decision::{AllowSettings, RejectionReason, Verdict};
pub use engine::VerificationEngine;
pub use request::VerificationRequest;
