//! Alert Router API Server
//!
//! HTTP ingestion endpoint that validates collected alert events and feeds
//! them through the alert engine.

use alerting::{AlertManager, NotificationSink};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use data_validator::Validator;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod routes;
mod settings;
mod sink;

pub use settings::{
    load_config, load_config_from, ServerConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH,
};
pub use sink::LogSink;

/// Errors that stop the server from starting
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid alert configuration: {0}")]
    Alert(#[from] alerting::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state shared across handlers
pub struct AppState {
    /// Alert engine
    pub manager: AlertManager,
    /// Input validator
    pub validator: Validator,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(config: &ServerConfig, sink: Arc<dyn NotificationSink>) -> Result<Self, ApiError> {
        Ok(Self {
            manager: AlertManager::new(&config.alert, sink)?,
            validator: Validator::new(config.validation.clone()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        })
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub version: String,
    pub uptime_seconds: u64,
    pub dedup: DedupStatus,
    pub channels: Vec<String>,
}

/// Dedup store occupancy
#[derive(Debug, Serialize)]
pub struct DedupStatus {
    pub size: usize,
    pub capacity: usize,
    pub window_hours: i64,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/alerts", post(routes::alerts::post_alerts))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.manager.store();

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        dedup: DedupStatus {
            size: store.len(),
            capacity: store.capacity(),
            window_hours: state.manager.window().num_hours(),
        },
        channels: state.manager.router().names().map(str::to_string).collect(),
    })
}

/// Initialize logging. `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the server until it is stopped
pub async fn run_server(config: ServerConfig) -> Result<(), ApiError> {
    let state = Arc::new(AppState::new(&config, Arc::new(LogSink))?);
    let app = create_router(state);

    info!("Starting alert router on {}", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
