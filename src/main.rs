//! Warden Server — License Verification & Enforcement Backend
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use warden_core::config::AppConfig;
use warden_core::error::AppError;

#[derive(Debug, Parser)]
#[command(
    name = "warden-server",
    about = "License verification and enforcement backend"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Run pending database migrations and exit.
    Migrate,
    /// Mint an operator bearer token and print it.
    IssueToken {
        /// Operator name placed in the token subject.
        #[arg(long)]
        subject: String,
        /// Role: admin, operator, or viewer.
        #[arg(long, default_value = "operator")]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let env = std::env::var("WARDEN_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run(config).await,
        Command::Migrate => migrate(config).await,
        Command::IssueToken { subject, role } => issue_token(&config, &subject, &role),
    };

    if let Err(e) = result {
        tracing::error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Connect and run migrations, then exit.
async fn migrate(config: AppConfig) -> Result<(), AppError> {
    let pool = warden_database::connection::DatabasePool::connect(&config.database).await?;
    warden_database::migration::run_migrations(pool.pool()).await?;
    pool.close().await;
    Ok(())
}

/// Mint an operator token from the configured signing secret.
fn issue_token(config: &AppConfig, subject: &str, role: &str) -> Result<(), AppError> {
    let role: warden_auth::OperatorRole = role.parse()?;
    let encoder = warden_auth::JwtEncoder::new(&config.auth);
    let (token, expires_at) = encoder.generate(subject, role)?;
    println!("{token}");
    tracing::info!(subject, %role, %expires_at, "Operator token issued");
    Ok(())
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Warden v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Artifact storage ─────────────────────────────────
    let artifacts = warden_service::binary::ArtifactStore::new(format!(
        "{}/artifacts",
        config.storage.data_root
    ));
    artifacts.init().await?;

    // ── Step 2: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db = warden_database::connection::DatabasePool::connect(&config.database).await?;

    tracing::info!("Running database migrations...");
    warden_database::migration::run_migrations(db.pool()).await?;
    let db_pool = db.into_pool();

    // ── Step 3: Repositories ─────────────────────────────────────
    use warden_database::repositories;
    use warden_database::stores::{
        AttemptStore, BinaryStore, LicenseStore, MachineStore, SnapshotStore, StoreHealth,
        TokenStore, VerificationStore,
    };

    let license_store: Arc<dyn LicenseStore> =
        Arc::new(repositories::LicenseRepository::new(db_pool.clone()));
    let machine_store: Arc<dyn MachineStore> =
        Arc::new(repositories::MachineRepository::new(db_pool.clone()));
    let attempt_store: Arc<dyn AttemptStore> =
        Arc::new(repositories::AttemptRepository::new(db_pool.clone()));
    let binary_store: Arc<dyn BinaryStore> =
        Arc::new(repositories::BinaryRepository::new(db_pool.clone()));
    let token_store: Arc<dyn TokenStore> =
        Arc::new(repositories::TokenRepository::new(db_pool.clone()));
    let snapshot_store: Arc<dyn SnapshotStore> =
        Arc::new(repositories::SnapshotRepository::new(db_pool.clone()));
    let verification_store: Arc<dyn VerificationStore> =
        Arc::new(repositories::PgVerificationStore::new(db_pool.clone()));
    let store_health: Arc<dyn StoreHealth> =
        Arc::new(repositories::PgHealthProbe::new(db_pool.clone()));

    // ── Step 4: Cache + auth ─────────────────────────────────────
    let cache = warden_cache::LicenseCache::new(&config.cache);
    let jwt_decoder = Arc::new(warden_auth::JwtDecoder::new(&config.auth));

    // ── Step 5: Engine + services ────────────────────────────────
    let engine = Arc::new(warden_engine::VerificationEngine::new(
        Arc::clone(&verification_store),
        config.enforcement.clone(),
    ));

    let license_service = Arc::new(warden_service::license::LicenseService::new(
        Arc::clone(&license_store),
        Arc::clone(&machine_store),
        Arc::clone(&attempt_store),
        Arc::clone(&binary_store),
        cache.clone(),
    ));

    let binary_service = Arc::new(warden_service::binary::BinaryService::new(
        Arc::clone(&binary_store),
        Arc::clone(&token_store),
        Arc::clone(&attempt_store),
        artifacts,
        config.storage.download_token_ttl_seconds,
    ));

    let geo: Arc<dyn warden_telemetry::GeoResolver> = Arc::new(
        warden_telemetry::StaticGeoResolver::from_table(&config.telemetry.geo_table),
    );
    let telemetry_service = warden_telemetry::TelemetryService::new(
        Arc::clone(&license_store),
        Arc::clone(&attempt_store),
        Arc::clone(&binary_store),
        Arc::clone(&machine_store),
        Arc::clone(&snapshot_store),
        geo,
        config.telemetry.clone(),
    );

    tracing::info!("Services initialized");

    // ── Step 6: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, _shutdown_rx) = watch::channel(false);

    // ── Step 7: Background worker ────────────────────────────────
    let mut scheduler = if config.worker.enabled {
        tracing::info!("Starting background worker...");
        let scheduler = warden_worker::CronScheduler::new(config.worker.clone()).await?;
        scheduler
            .register_default_tasks(
                warden_worker::jobs::TokenCleanupJob::new(Arc::clone(&token_store)),
                warden_worker::jobs::SnapshotJob::new(telemetry_service.clone()),
            )
            .await?;
        scheduler.start().await?;
        tracing::info!("Background worker started");
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── Step 8: Build and start HTTP server ──────────────────────
    let app_state = warden_api::state::AppState {
        config: Arc::new(config.clone()),
        jwt_decoder,
        engine,
        license_service,
        binary_service,
        telemetry_service: Arc::new(telemetry_service),
        store_health,
        verify_limiter: Arc::new(warden_api::middleware::rate_limit::RateLimiter::new(
            config.enforcement.verify_rate_per_minute,
        )),
        started_at: chrono::Utc::now(),
    };

    let app = warden_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Warden server listening on {}", addr);

    // ── Step 9: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }

    tracing::info!("Warden server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
