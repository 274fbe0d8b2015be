use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hlsmith_core::{
    create_authenticator, create_object_store, load_config, validate_config, Authenticator,
    FfmpegToolchain, ProgressTracker, Toolchain, TranscodeEngine, TranscodeOrchestrator,
};
use hlsmith_server::api::create_router;
use hlsmith_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("HLSMITH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {}", config.auth.method.as_str());
    info!("Storage backend: {}", config.storage.backend.as_str());

    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    let store = create_object_store(&config.storage).context("Failed to create object store")?;

    tokio::fs::create_dir_all(&config.transcode.temp_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create temp directory {:?}",
                config.transcode.temp_dir
            )
        })?;

    let toolchain = Arc::new(FfmpegToolchain::new(&config.transcode));
    // Jobs will fail at probe time, but the API stays up for status queries
    if let Err(e) = toolchain.validate().await {
        warn!(error = %e, "FFmpeg toolchain not available");
    }

    let tracker = ProgressTracker::new(&config.progress);
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let sweeper = tracker.spawn_sweeper(
        Duration::from_secs(config.progress.sweep_interval_secs.max(1)),
        shutdown_tx.subscribe(),
    );

    let engine = TranscodeEngine::new(config.transcode.clone(), store, toolchain, tracker);
    let orchestrator = Arc::new(TranscodeOrchestrator::new(
        config.orchestrator.clone(),
        engine,
    ));
    info!(
        max_concurrent = config.orchestrator.max_concurrent_jobs,
        max_queued = config.orchestrator.max_queued_jobs,
        renditions = config.transcode.renditions.len(),
        "Transcode orchestrator ready"
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, authenticator, orchestrator));
    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    let _ = shutdown_tx.send(());
    let _ = sweeper.await;
    info!("Progress sweeper stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
