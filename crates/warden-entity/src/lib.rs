//! # warden-entity
//!
//! Entity models for the Warden licensing domain. Each module holds one
//! aggregate: the database row struct, its enums, and the pure state
//! functions computed over stored fields.

pub mod binary;
pub mod license;
pub mod machine;
pub mod snapshot;
pub mod token;
pub mod verification;
