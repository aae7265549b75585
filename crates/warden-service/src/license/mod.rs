//! License mutation and read services.

pub mod service;

pub use service::{LicenseService, LicenseStats, MachineWithStatus};
