//! Artifact storage configuration.

use serde::{Deserialize, Serialize};

/// Settings for wrapped-binary artifact storage on local disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for stored artifacts.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// Download token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub download_token_ttl_seconds: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            download_token_ttl_seconds: default_token_ttl(),
        }
    }
}

fn default_data_root() -> String {
    "./data".to_string()
}

fn default_token_ttl() -> i64 {
    300
}
