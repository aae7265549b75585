//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use warden_core::config::worker::WorkerConfig;
use warden_core::error::AppError;

use crate::jobs::{SnapshotJob, TokenCleanupJob};

/// Cron-based scheduler for periodic background tasks.
pub struct CronScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
    config: WorkerConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new(config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, config })
    }

    /// Register all default scheduled tasks.
    pub async fn register_default_tasks(
        &self,
        cleanup: TokenCleanupJob,
        snapshot: SnapshotJob,
    ) -> Result<(), AppError> {
        self.register_token_cleanup(cleanup).await?;
        self.register_telemetry_snapshot(snapshot).await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Token cleanup on the configured cadence (hourly by default).
    async fn register_token_cleanup(&self, job: TokenCleanupJob) -> Result<(), AppError> {
        let job = Arc::new(job);
        let cron = CronJob::new_async(self.config.token_cleanup_cron.as_str(), move |_uuid, _lock| {
            let job = Arc::clone(&job);
            Box::pin(async move {
                if let Err(e) = job.run().await {
                    tracing::error!("Token cleanup failed: {}", e);
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create token_cleanup schedule: {}", e))
        })?;

        self.scheduler.add(cron).await.map_err(|e| {
            AppError::internal(format!("Failed to add token_cleanup schedule: {}", e))
        })?;

        tracing::info!(
            cron = %self.config.token_cleanup_cron,
            "Registered: token_cleanup"
        );
        Ok(())
    }

    /// Telemetry snapshot on the configured cadence (every 5 minutes by
    /// default).
    async fn register_telemetry_snapshot(&self, job: SnapshotJob) -> Result<(), AppError> {
        let job = Arc::new(job);
        let cron = CronJob::new_async(
            self.config.telemetry_snapshot_cron.as_str(),
            move |_uuid, _lock| {
                let job = Arc::clone(&job);
                Box::pin(async move {
                    if let Err(e) = job.run().await {
                        tracing::error!("Telemetry snapshot failed: {}", e);
                    }
                })
            },
        )
        .map_err(|e| {
            AppError::internal(format!(
                "Failed to create telemetry_snapshot schedule: {}",
                e
            ))
        })?;

        self.scheduler.add(cron).await.map_err(|e| {
            AppError::internal(format!("Failed to add telemetry_snapshot schedule: {}", e))
        })?;

        tracing::info!(
            cron = %self.config.telemetry_snapshot_cron,
            "Registered: telemetry_snapshot"
        );
        Ok(())
    }
}
