//! Route definitions for the Warden HTTP API.
//!
//! Dashboard routes live under `/api` and require operator bearer
//! tokens (enforced by the `AuthOperator` extractor in each handler);
//! the machine-facing routes (`/api/verify`, `/download/{id}`) are
//! credentialed by the license itself.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
///
/// Receives the fully-constructed `AppState` and threads it through
/// every route via `.with_state(state)`.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_bytes as usize;

    let api_routes = Router::new()
        .merge(license_routes())
        .merge(binary_routes())
        .merge(telemetry_routes())
        .merge(verify_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .route("/download/{id}", get(handlers::download::download_binary))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// License CRUD, lifecycle, and stats
fn license_routes() -> Router<AppState> {
    Router::new()
        .route("/license/create", post(handlers::license::create_license))
        .route("/license/{id}", get(handlers::license::get_license))
        .route("/license/{id}", patch(handlers::license::patch_license))
        .route("/license/{id}", delete(handlers::license::delete_license))
        .route(
            "/license/{id}/revoke",
            post(handlers::license::revoke_license),
        )
        .route(
            "/license/{id}/re-enable",
            post(handlers::license::re_enable_license),
        )
        .route("/license/{id}/stats", get(handlers::license::license_stats))
        .route("/licenses", get(handlers::license::list_licenses))
        .route(
            "/binary/{id}/licenses",
            get(handlers::license::list_binary_licenses),
        )
}

/// Binary upload, listing, attempt log, download tokens
fn binary_routes() -> Router<AppState> {
    Router::new()
        .route("/binary/upload", post(handlers::binary::upload_binary))
        .route("/binaries", get(handlers::binary::list_binaries))
        .route("/binary/{id}", get(handlers::binary::get_binary))
        .route(
            "/binary/{id}/verification-attempts",
            get(handlers::binary::binary_attempts),
        )
        .route(
            "/binary/{id}/download-token",
            post(handlers::binary::issue_download_token),
        )
}

/// Analytics and dashboard rollups
fn telemetry_routes() -> Router<AppState> {
    Router::new()
        .route("/analytics", get(handlers::telemetry::analytics))
        .route("/telemetry/dashboard", get(handlers::telemetry::dashboard))
}

/// The machine-facing verification endpoint
fn verify_routes() -> Router<AppState> {
    Router::new().route("/verify", post(handlers::verify::verify))
}

/// Health check endpoints (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/detailed", get(handlers::health::detailed_health))
}

/// Build CORS layer from configuration
fn build_cors_layer(state: &AppState) -> CorsLayer {
    use axum::http::Method;
    use tower_http::cors::Any;

    let cors_config = &state.config.server.cors;

    let mut cors = CorsLayer::new().allow_headers(Any);

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<axum::http::HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    let methods: Vec<Method> = cors_config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    cors = cors.allow_methods(methods);

    cors.max_age(std::time::Duration::from_secs(cors_config.max_age_seconds))
}
