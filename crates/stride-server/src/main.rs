//! Stride server binary.
//!
//! Starts the mission, runs the mission monitor in the background and serves
//! the status and audio endpoints until SIGTERM/SIGINT, then stops the
//! monitor and waits for it to close the session.

use std::net::SocketAddr;
use std::sync::Arc;
use stride_location::{DawarichClient, LocationFeed};
use stride_mission::{ProgressTracker, SystemClock};
use stride_narration::{GeminiTts, NarrationPipeline, ScriptTemplates};
use stride_server::config::{self, resolve_config_path};
use stride_server::monitor::MissionMonitor;
use stride_server::{app, init_tracing, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("failed to load .env: {}", e);
        }
    }

    let (config_path, config_source) = resolve_config_path();

    let config = config::load_config(Some(&config_path))
        .expect("failed to load configuration; the server cannot start without valid config");

    init_tracing(&config.logging);

    tracing::info!(
        source = config_source,
        path = %config_path,
        "resolved startup configuration path"
    );

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(1);
    }

    // Location service
    let location = DawarichClient::new(config.dawarich())
        .expect("failed to build location client; check location settings");
    let health = location.health().await;
    tracing::info!(
        api_base = location.api_base(),
        status = ?health.status,
        "location service health"
    );
    let feed: Arc<dyn LocationFeed> = Arc::new(location);

    // Narration
    let tts = GeminiTts::new(config.gemini()).expect("failed to build speech client");
    let narration = Arc::new(NarrationPipeline::new(
        ScriptTemplates::new(config.story_layout()),
        Arc::new(tts),
        &config.narration.voice,
        config.narration.temperature,
    ));

    // Mission
    let tracker = ProgressTracker::start(config.tracker(), feed, Arc::new(SystemClock))
        .await
        .expect("failed to start mission; check mission.progress_dir");

    let (monitor, status) = MissionMonitor::new(tracker, narration, config.poll_interval());
    let monitor = monitor.spawn();

    let state = AppState {
        status,
        stories_dir: config.mission.stories_dir.clone(),
    };
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, mission = %config.mission.name, "starting stride server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    match monitor.shutdown(config.shutdown_grace()).await {
        Ok(status) => tracing::info!(result = %status, "mission closed"),
        Err(e) => tracing::error!(error = %e, "mission monitor ended with an error"),
    }

    tracing::info!("stride server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
