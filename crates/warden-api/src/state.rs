//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use warden_auth::JwtDecoder;
use warden_core::config::AppConfig;
use warden_database::stores::StoreHealth;
use warden_engine::VerificationEngine;
use warden_service::binary::BinaryService;
use warden_service::license::LicenseService;
use warden_telemetry::TelemetryService;

use crate::middleware::rate_limit::RateLimiter;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration.
    pub config: Arc<AppConfig>,

    // ── Auth ─────────────────────────────────────────────────
    /// Operator token decoder and validator.
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Core services ────────────────────────────────────────
    /// Verification engine (machine-facing decision protocol).
    pub engine: Arc<VerificationEngine>,
    /// License mutation and read service.
    pub license_service: Arc<LicenseService>,
    /// Binary artifact service.
    pub binary_service: Arc<BinaryService>,
    /// Telemetry aggregation service.
    pub telemetry_service: Arc<TelemetryService>,

    // ── Infrastructure ───────────────────────────────────────
    /// Store liveness probe for health checks.
    pub store_health: Arc<dyn StoreHealth>,
    /// Per-IP limiter for the public verification endpoint.
    pub verify_limiter: Arc<RateLimiter>,
    /// Server start time, for uptime reporting.
    pub started_at: DateTime<Utc>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish()
    }
}
