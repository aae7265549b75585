//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Settings for the cron-scheduled background worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Cron expression for expired download-token cleanup.
    #[serde(default = "default_token_cleanup_cron")]
    pub token_cleanup_cron: String,
    /// Cron expression for the periodic telemetry snapshot.
    #[serde(default = "default_snapshot_cron")]
    pub telemetry_snapshot_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            token_cleanup_cron: default_token_cleanup_cron(),
            telemetry_snapshot_cron: default_snapshot_cron(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_token_cleanup_cron() -> String {
    // Hourly, on the hour.
    "0 0 * * * *".to_string()
}

fn default_snapshot_cron() -> String {
    "0 */5 * * * *".to_string()
}
