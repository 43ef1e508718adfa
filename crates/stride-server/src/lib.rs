//! Stride server library logic.

pub mod api;
pub mod api_mission;
pub mod config;
pub mod monitor;

use axum::{routing::get, Extension, Json, Router};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use stride_types::StatusSnapshot;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Application state shared across all request handlers.
///
/// Handlers only read: the status receiver is fed by the mission monitor,
/// and audio is read from `stories_dir`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Latest mission status published by the monitor.
    pub status: watch::Receiver<StatusSnapshot>,
    /// Root of the per-mission story directories.
    pub stories_dir: PathBuf,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/mission/{missionName}/status",
            get(api_mission::status_handler),
        )
        .route(
            "/mission/{missionName}/audio",
            get(api_mission::audio_list_handler),
        )
        .route(
            "/audio/{missionName}/{voiceType}/{fileName}",
            get(api_mission::audio_file_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}

/// Installs the global tracing subscriber.
pub fn init_tracing(logging: &config::LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
