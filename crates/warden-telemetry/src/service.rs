//! Telemetry service assembling reports from the stores.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use warden_core::AppResult;
use warden_core::config::telemetry::TelemetryConfig;
use warden_database::stores::{
    AttemptStore, BinaryStore, LicenseStore, MachineStore, SnapshotStore,
};
use warden_entity::snapshot::TelemetrySnapshot;

use crate::aggregate::{self, AnalyticsReport, DashboardSummary};
use crate::geo::GeoResolver;

/// Read-only aggregation service over the persistence layer.
///
/// Mutates nothing: it reads a (possibly slightly stale) snapshot of
/// the stores, which is acceptable because its output feeds dashboards,
/// not enforcement.
#[derive(Clone)]
pub struct TelemetryService {
    licenses: Arc<dyn LicenseStore>,
    attempts: Arc<dyn AttemptStore>,
    binaries: Arc<dyn BinaryStore>,
    machines: Arc<dyn MachineStore>,
    snapshots: Arc<dyn SnapshotStore>,
    geo: Arc<dyn GeoResolver>,
    config: TelemetryConfig,
}

impl std::fmt::Debug for TelemetryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryService")
            .field("config", &self.config)
            .finish()
    }
}

impl TelemetryService {
    /// Create a new telemetry service.
    pub fn new(
        licenses: Arc<dyn LicenseStore>,
        attempts: Arc<dyn AttemptStore>,
        binaries: Arc<dyn BinaryStore>,
        machines: Arc<dyn MachineStore>,
        snapshots: Arc<dyn SnapshotStore>,
        geo: Arc<dyn GeoResolver>,
        config: TelemetryConfig,
    ) -> Self {
        Self {
            licenses,
            attempts,
            binaries,
            machines,
            snapshots,
            geo,
            config,
        }
    }

    /// Compute the full analytics report for the configured window
    /// ending at `now`.
    pub async fn analytics(&self, now: DateTime<Utc>) -> AppResult<AnalyticsReport> {
        let window = Duration::hours(self.config.window_hours);
        let window_start = now - window;
        let previous_start = window_start - window;

        // One scan covers both the current and the prior window; the
        // split happens in memory.
        let all = self.attempts.since(previous_start).await?;
        let (previous, current): (Vec<_>, Vec<_>) =
            all.into_iter().partition(|a| a.timestamp < window_start);

        let licenses = self.licenses.list_all().await?;
        let binaries = self.binaries.list().await?;

        Ok(AnalyticsReport {
            window_start,
            window_end: now,
            total_attempts: current.len() as u64,
            success_rate: aggregate::success_rate(&current),
            hourly_activity: aggregate::hourly_activity(&current),
            license_status: aggregate::license_status(&licenses, now),
            top_binaries: aggregate::top_binaries(&binaries, &licenses, self.config.top_n),
            geographic_distribution: aggregate::geographic_distribution(
                &current,
                self.geo.as_ref(),
            ),
            growth_rate: aggregate::growth_rate(current.len() as u64, previous.len() as u64),
        })
    }

    /// Compute the dashboard summary: entity counts plus the most
    /// active licenses over the trailing 24 hours.
    pub async fn dashboard(&self, now: DateTime<Utc>) -> AppResult<DashboardSummary> {
        let attempts_24h = self.attempts.since(now - Duration::hours(24)).await?;
        let licenses = self.licenses.list_all().await?;

        Ok(DashboardSummary {
            total_binaries: self.binaries.count().await?,
            total_licenses: licenses.len() as u64,
            license_status: aggregate::license_status(&licenses, now),
            total_machines: self.machines.count().await?,
            attempts_24h: attempts_24h.len() as u64,
            most_active_licenses: aggregate::most_active_licenses(
                &attempts_24h,
                self.config.top_n,
            ),
        })
    }

    /// Recompute the analytics report and persist it as a snapshot.
    pub async fn capture_snapshot(&self, now: DateTime<Utc>) -> AppResult<()> {
        let report = self.analytics(now).await?;
        let snapshot = TelemetrySnapshot {
            id: Uuid::new_v4(),
            captured_at: now,
            window_start: report.window_start,
            window_end: report.window_end,
            report: serde_json::to_value(&report)?,
        };
        self.snapshots.insert(&snapshot).await?;
        info!(
            attempts = report.total_attempts,
            success_rate = report.success_rate,
            "Telemetry snapshot captured"
        );
        Ok(())
    }
}
