//! # warden-worker
//!
//! Background maintenance for Warden: expired download-token cleanup
//! and the periodic telemetry snapshot. Every job is idempotent, so an
//! overlapping or repeated run is harmless.

pub mod jobs;
pub mod scheduler;

pub use scheduler::CronScheduler;
