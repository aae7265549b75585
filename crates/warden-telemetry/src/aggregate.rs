//! Pure aggregation functions over the attempt log and license set.

use std::collections::HashMap;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_entity::binary::BinarySummary;
use warden_entity::license::{License, LicenseState};
use warden_entity::verification::VerificationAttempt;

use crate::geo::GeoResolver;

/// One hour-of-day activity bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyBucket {
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Attempts whose timestamp falls in this hour.
    pub count: u64,
}

/// Dashboard partition of all licenses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseStatusDistribution {
    /// Licenses that would currently verify (includes exhausted ones,
    /// which are neither revoked nor expired).
    pub active: u64,
    /// Revoked licenses; revocation outranks expiry when both hold.
    pub revoked: u64,
    /// Expired, non-revoked licenses.
    pub expired: u64,
}

/// One binary ranked by its total execution count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryUsage {
    /// Binary identifier.
    pub binary_id: Uuid,
    /// Binary name.
    pub name: String,
    /// Total executions across all of the binary's licenses.
    pub total_executions: i64,
    /// Number of licenses attached.
    pub license_count: i64,
}

/// One country slice of the geographic distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoSlice {
    /// ISO country code, or "unknown".
    pub country: String,
    /// Attempts attributed to this country.
    pub count: u64,
    /// Share of all attempts in the window, in percent.
    pub percent: f64,
}

/// One license ranked by attempt volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseActivity {
    /// License identifier.
    pub license_id: Uuid,
    /// Attempts in the window.
    pub attempts: u64,
}

/// Full analytics report served by `/analytics` and persisted by the
/// snapshot job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    /// Start of the aggregation window.
    pub window_start: DateTime<Utc>,
    /// End of the aggregation window.
    pub window_end: DateTime<Utc>,
    /// Attempts in the window.
    pub total_attempts: u64,
    /// Allowed share of attempts, in percent.
    pub success_rate: f64,
    /// 24 hour-of-day buckets over the window.
    pub hourly_activity: Vec<HourlyBucket>,
    /// Partition of all licenses.
    pub license_status: LicenseStatusDistribution,
    /// Binaries ranked by execution count.
    pub top_binaries: Vec<BinaryUsage>,
    /// Attempts grouped by IP-derived country.
    pub geographic_distribution: Vec<GeoSlice>,
    /// Volume change vs the prior equal-length window, in percent;
    /// None when the prior window is empty.
    pub growth_rate: Option<f64>,
}

/// Counts and most-active licenses for the dashboard landing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Total binaries.
    pub total_binaries: u64,
    /// Total licenses.
    pub total_licenses: u64,
    /// License partition.
    pub license_status: LicenseStatusDistribution,
    /// Total machine instances.
    pub total_machines: u64,
    /// Attempts in the trailing 24 hours.
    pub attempts_24h: u64,
    /// Licenses ranked by attempt volume in the trailing 24 hours.
    pub most_active_licenses: Vec<LicenseActivity>,
}

/// Allowed share of the given attempts, in percent. Empty input is 0.
pub fn success_rate(attempts: &[VerificationAttempt]) -> f64 {
    if attempts.is_empty() {
        return 0.0;
    }
    let successes = attempts.iter().filter(|a| a.success).count();
    successes as f64 / attempts.len() as f64 * 100.0
}

/// Bucket the attempts into the 24 hours of the day.
pub fn hourly_activity(attempts: &[VerificationAttempt]) -> Vec<HourlyBucket> {
    let mut counts = [0u64; 24];
    for attempt in attempts {
        counts[attempt.timestamp.hour() as usize] += 1;
    }
    counts
        .iter()
        .enumerate()
        .map(|(hour, &count)| HourlyBucket {
            hour: hour as u32,
            count,
        })
        .collect()
}

/// Partition all licenses into the dashboard's three buckets.
pub fn license_status(licenses: &[License], now: DateTime<Utc>) -> LicenseStatusDistribution {
    let mut distribution = LicenseStatusDistribution {
        active: 0,
        revoked: 0,
        expired: 0,
    };
    for license in licenses {
        match license.state(now) {
            LicenseState::Revoked => distribution.revoked += 1,
            LicenseState::Expired => distribution.expired += 1,
            // Exhausted licenses are neither revoked nor expired; the
            // dashboard counts them with the active population.
            LicenseState::Active | LicenseState::Exhausted => distribution.active += 1,
        }
    }
    distribution
}

/// Rank binaries by total execution count, ties broken by earliest
/// creation.
pub fn top_binaries(
    binaries: &[BinarySummary],
    licenses: &[License],
    limit: usize,
) -> Vec<BinaryUsage> {
    let mut executions: HashMap<Uuid, i64> = HashMap::new();
    for license in licenses {
        *executions.entry(license.binary_id).or_default() += license.executions_used;
    }

    let mut ranked: Vec<(&BinarySummary, i64)> = binaries
        .iter()
        .map(|b| (b, executions.get(&b.id).copied().unwrap_or(0)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.created_at.cmp(&b.0.created_at)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(binary, total_executions)| BinaryUsage {
            binary_id: binary.id,
            name: binary.name.clone(),
            total_executions,
            license_count: binary.license_count,
        })
        .collect()
}

/// Group attempts by IP-derived country with percentages of the total.
pub fn geographic_distribution(
    attempts: &[VerificationAttempt],
    resolver: &dyn GeoResolver,
) -> Vec<GeoSlice> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for attempt in attempts {
        let country = attempt
            .ip_address
            .as_deref()
            .and_then(|ip| resolver.country(ip))
            .unwrap_or_else(|| "unknown".to_string());
        *counts.entry(country).or_default() += 1;
    }

    let total = attempts.len() as f64;
    let mut slices: Vec<GeoSlice> = counts
        .into_iter()
        .map(|(country, count)| GeoSlice {
            country,
            count,
            percent: if total > 0.0 {
                count as f64 / total * 100.0
            } else {
                0.0
            },
        })
        .collect();
    slices.sort_by(|a, b| b.count.cmp(&a.count).then(a.country.cmp(&b.country)));
    slices
}

/// Percentage change of `current` vs `previous` attempt volume; None
/// when the prior window had no attempts.
pub fn growth_rate(current: u64, previous: u64) -> Option<f64> {
    if previous == 0 {
        return None;
    }
    Some((current as f64 - previous as f64) / previous as f64 * 100.0)
}

/// Rank licenses by attempt volume.
pub fn most_active_licenses(attempts: &[VerificationAttempt], limit: usize) -> Vec<LicenseActivity> {
    let mut counts: HashMap<Uuid, u64> = HashMap::new();
    for attempt in attempts {
        *counts.entry(attempt.license_id).or_default() += 1;
    }
    let mut ranked: Vec<LicenseActivity> = counts
        .into_iter()
        .map(|(license_id, attempts)| LicenseActivity {
            license_id,
            attempts,
        })
        .collect();
    ranked.sort_by(|a, b| b.attempts.cmp(&a.attempts).then(a.license_id.cmp(&b.license_id)));
    ranked.truncate(limit);
    ranked
}
