//! Telemetry aggregation configuration.

use serde::{Deserialize, Serialize};

/// Settings for the telemetry aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Analytics window length in hours.
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
    /// Number of entries in the most-active-licenses list.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Static CIDR-prefix → ISO country table for IP attribution,
    /// e.g. `["81.2.69.0/24=GB"]`. Unmatched addresses report "unknown".
    #[serde(default)]
    pub geo_table: Vec<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
            top_n: default_top_n(),
            geo_table: Vec::new(),
        }
    }
}

fn default_window_hours() -> i64 {
    24
}

fn default_top_n() -> usize {
    5
}
