//! # warden-service
//!
//! Business services sitting between the HTTP layer and the stores:
//! the license mutation service (create/patch/revoke/re-enable/delete
//! with the readonly contract), binary artifact handling, and the
//! per-request operator context.

pub mod binary;
pub mod context;
pub mod license;

pub use context::RequestContext;
