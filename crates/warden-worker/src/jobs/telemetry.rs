//! Periodic telemetry snapshot job.

use chrono::Utc;
use tracing::debug;

use warden_core::AppResult;
use warden_telemetry::TelemetryService;

/// Recomputes the analytics report and persists it as a snapshot row.
#[derive(Clone)]
pub struct SnapshotJob {
    telemetry: TelemetryService,
}

impl SnapshotJob {
    /// Create a new snapshot job.
    pub fn new(telemetry: TelemetryService) -> Self {
        Self { telemetry }
    }

    /// Run one snapshot pass.
    pub async fn run(&self) -> AppResult<()> {
        debug!("Capturing telemetry snapshot");
        self.telemetry.capture_snapshot(Utc::now()).await
    }
}
