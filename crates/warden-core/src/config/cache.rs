//! License read-cache configuration.

use serde::{Deserialize, Serialize};

/// Settings for the in-process license cache.
///
/// The cache serves dashboard reads only; the verification engine always
/// reads the authoritative row inside its own transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached licenses.
    #[serde(default = "default_capacity")]
    pub capacity: u64,
    /// Entry time-to-live in milliseconds.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl_ms: default_ttl_ms(),
        }
    }
}

fn default_capacity() -> u64 {
    10_000
}

fn default_ttl_ms() -> u64 {
    500
}
