//! # warden-telemetry
//!
//! Read-only rollups over the verification attempt log, licenses, and
//! machine instances. Every aggregate is a pure function of its inputs:
//! no hidden counters, safe to recompute at any cadence, and safe to run
//! on a stale snapshot since the output feeds dashboards, never
//! enforcement.

pub mod aggregate;
pub mod geo;
pub mod service;

pub use aggregate::{AnalyticsReport, DashboardSummary};
pub use geo::{GeoResolver, StaticGeoResolver};
pub use service::TelemetryService;
