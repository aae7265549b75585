//! Persisted telemetry snapshot model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A periodic rollup of the analytics report, written by the background
/// worker. The live analytics endpoint always recomputes; snapshots
/// only serve history.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TelemetrySnapshot {
    /// Unique snapshot identifier.
    pub id: Uuid,
    /// When the snapshot was taken.
    pub captured_at: DateTime<Utc>,
    /// Start of the aggregation window.
    pub window_start: DateTime<Utc>,
    /// End of the aggregation window.
    pub window_end: DateTime<Utc>,
    /// The full analytics report as JSON.
    pub report: serde_json::Value,
}
