//! Shared test helpers for integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use chrono::Utc;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use warden_auth::{JwtDecoder, JwtEncoder, OperatorRole};
use warden_core::config::app::ServerConfig;
use warden_core::config::auth::AuthConfig;
use warden_core::config::cache::CacheConfig;
use warden_core::config::enforcement::EnforcementConfig;
use warden_core::config::logging::LoggingConfig;
use warden_core::config::storage::StorageConfig;
use warden_core::config::telemetry::TelemetryConfig;
use warden_core::config::worker::WorkerConfig;
use warden_core::config::{AppConfig, DatabaseConfig};
use warden_database::memory::MemoryStore;
use warden_database::stores::BinaryStore;
use warden_entity::binary::Binary;
use warden_service::binary::{ArtifactStore, BinaryService};
use warden_service::license::LicenseService;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared in-memory store for direct seeding and inspection
    pub store: Arc<MemoryStore>,
    /// Token encoder matching the app's decoder
    encoder: JwtEncoder,
    /// Artifact directory backing uploads/downloads
    pub artifact_dir: PathBuf,
}

impl TestApp {
    /// Create a new test application over a fresh in-memory store.
    pub async fn new() -> Self {
        let auth = AuthConfig {
            jwt_secret: "integration-test-secret-key".to_string(),
            issuer: "warden-test".to_string(),
            token_ttl_seconds: 3600,
        };
        let enforcement = EnforcementConfig {
            max_commit_retries: 16,
            ..EnforcementConfig::default()
        };

        let artifact_dir =
            std::env::temp_dir().join(format!("warden-it-{}", Uuid::new_v4()));
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://unused@localhost/unused".to_string(),
                max_connections: 1,
                min_connections: 1,
                connect_timeout_seconds: 1,
                idle_timeout_seconds: 1,
            },
            cache: CacheConfig::default(),
            auth: auth.clone(),
            enforcement: enforcement.clone(),
            storage: StorageConfig {
                data_root: artifact_dir.display().to_string(),
                download_token_ttl_seconds: 300,
            },
            telemetry: TelemetryConfig::default(),
            worker: WorkerConfig {
                enabled: false,
                ..WorkerConfig::default()
            },
            logging: LoggingConfig::default(),
        };

        let store = Arc::new(MemoryStore::new());
        let artifacts = ArtifactStore::new(&artifact_dir);
        artifacts.init().await.expect("Failed to init artifact dir");

        let cache = warden_cache::LicenseCache::new(&config.cache);
        let engine = Arc::new(warden_engine::VerificationEngine::new(
            store.clone(),
            enforcement,
        ));
        let license_service = Arc::new(LicenseService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            cache,
        ));
        let binary_service = Arc::new(BinaryService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            artifacts,
            config.storage.download_token_ttl_seconds,
        ));
        let geo: Arc<dyn warden_telemetry::GeoResolver> =
            Arc::new(warden_telemetry::StaticGeoResolver::from_table(&[]));
        let telemetry_service = Arc::new(warden_telemetry::TelemetryService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            geo,
            config.telemetry.clone(),
        ));

        let state = warden_api::state::AppState {
            config: Arc::new(config),
            jwt_decoder: Arc::new(JwtDecoder::new(&auth)),
            engine,
            license_service,
            binary_service,
            telemetry_service,
            store_health: store.clone(),
            verify_limiter: Arc::new(
                warden_api::middleware::rate_limit::RateLimiter::new(10_000),
            ),
            started_at: Utc::now(),
        };

        let router = warden_api::router::build_router(state);

        Self {
            router,
            store,
            encoder: JwtEncoder::new(&auth),
            artifact_dir,
        }
    }

    /// Mint a bearer token for the given role.
    pub fn token(&self, role: OperatorRole) -> String {
        self.encoder
            .generate("integration-tester", role)
            .expect("Failed to mint token")
            .0
    }

    /// Seed a binary row with a real artifact file on disk.
    pub async fn seed_binary(&self) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let artifact_path = format!("{id}.bin");

        tokio::fs::write(
            self.artifact_dir.join(&artifact_path),
            b"wrapped-binary-bytes",
        )
        .await
        .expect("Failed to write artifact");

        let binary = Binary {
            id,
            name: "app.exe".to_string(),
            original_size: 512,
            wrapped_size: 20,
            artifact_path,
            created_at: now,
            updated_at: now,
        };
        BinaryStore::insert(self.store.as_ref(), &binary)
            .await
            .expect("Failed to seed binary");
        id
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let (status, bytes) = self.request_raw(method, path, body, token).await;
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body }
    }

    /// Make an HTTP request and return the raw body bytes.
    pub async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Vec<u8>) {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .expect("Failed to read body")
            .to_vec();

        (status, bytes)
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

/// Default creation body for a patchable async license.
pub fn create_license_body(binary_id: Uuid) -> Value {
    serde_json::json!({
        "binary_id": binary_id,
        "license_type": "patchable",
        "sync_mode": false,
        "grace_period": 3600,
        "network_failure_kill_count": 5,
        "check_interval_ms": 60000,
        "kill_method": "stop",
        "max_executions": null,
        "expires_in_seconds": null,
    })
}
