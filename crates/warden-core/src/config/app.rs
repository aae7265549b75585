//! HTTP server configuration.

use serde::{Deserialize, Serialize};

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS settings for the dashboard origin.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Maximum accepted request body size in bytes (binary uploads).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any.
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
    /// Allowed HTTP methods.
    #[serde(default = "default_methods")]
    pub allowed_methods: Vec<String>,
    /// Preflight cache duration in seconds.
    #[serde(default = "default_max_age")]
    pub max_age_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: CorsConfig::default(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_origins(),
            allowed_methods: default_methods(),
            max_age_seconds: default_max_age(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> u64 {
    256 * 1024 * 1024
}

fn default_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_methods() -> Vec<String> {
    ["GET", "POST", "PATCH", "DELETE", "OPTIONS"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_max_age() -> u64 {
    3600
}
