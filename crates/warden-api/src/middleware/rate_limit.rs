//! Fixed-window rate limiter for the public verification endpoint.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use warden_core::{AppError, AppResult};

/// Window length for the fixed-window counter.
const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Bucket {
    window_start: Instant,
    count: u32,
}

/// Per-key fixed-window request counter.
///
/// Keys are caller IPs; a key exceeding the per-minute budget gets a
/// rate-limit error until its window rolls over. Entries for idle keys
/// are reset lazily on their next request.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
    limit_per_minute: u32,
}

impl RateLimiter {
    /// Create a limiter with the given per-minute budget.
    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            limit_per_minute,
        }
    }

    /// Count one request for `key`, failing when the budget is spent.
    pub fn check(&self, key: &str) -> AppResult<()> {
        let now = Instant::now();
        let mut bucket = self.buckets.entry(key.to_string()).or_insert(Bucket {
            window_start: now,
            count: 0,
        });

        if now.duration_since(bucket.window_start) >= WINDOW {
            bucket.window_start = now;
            bucket.count = 0;
        }

        if bucket.count >= self.limit_per_minute {
            return Err(AppError::rate_limit(
                "Verification rate limit exceeded; slow down",
            ));
        }
        bucket.count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_enforced_per_key() {
        let limiter = RateLimiter::new(3);
        for _ in 0..3 {
            assert!(limiter.check("198.51.100.1").is_ok());
        }
        assert!(limiter.check("198.51.100.1").is_err());
        // A different key has its own budget.
        assert!(limiter.check("198.51.100.2").is_ok());
    }
}
