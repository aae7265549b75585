//! Built-in job implementations.

pub mod cleanup;
pub mod telemetry;

pub use cleanup::TokenCleanupJob;
pub use telemetry::SnapshotJob;
