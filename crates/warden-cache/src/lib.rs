//! # warden-cache
//!
//! In-process read cache for license rows, used by dashboard read paths
//! only. The verification engine never reads through this cache: it
//! loads the authoritative row inside its own transaction, so a revoke
//! committed before a verification begins is always visible to it.

pub mod license;

pub use license::LicenseCache;
