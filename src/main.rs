//! Feed Prefetch - media cache and image prefetch service
//!
//! Runs the prefetch subsystem as a long-lived HTTP service.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feed_prefetch::fetch::{FetchExecutor, HttpImageLoader};
use feed_prefetch::persistence::FileSnapshotStorage;
use feed_prefetch::{create_router, spawn_expiry_sweep, AppState, Config, MediaCache};

/// Main entry point for the prefetch service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the image cache from its snapshot
/// 4. Start the background expiry sweep
/// 5. Serve the API until SIGINT/SIGTERM
/// 6. Drain warm-up passes and flush the snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feed_prefetch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Feed Prefetch Service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, snapshot_dir={}, fetch_timeout={}s, sweep_interval={}s",
        config.server_port,
        config.snapshot_dir.display(),
        config.fetch_timeout,
        config.sweep_interval
    );

    let storage = Arc::new(FileSnapshotStorage::new(config.snapshot_dir.clone()));
    let cache = Arc::new(MediaCache::open(storage).await);

    let loader = HttpImageLoader::with_timeout(config.fetch_timeout())
        .context("Failed to build HTTP client")?;
    let executor = FetchExecutor::new(Arc::new(loader), config.fetch_timeout());
    let state = AppState::build(cache.clone(), executor);
    let warmer = state.warmer.clone();

    let sweep_handle = spawn_expiry_sweep(cache.clone(), config.sweep_interval);
    info!("Background expiry sweep started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("Server error")?;

    if !warmer.shutdown(config.shutdown_grace()).await {
        warn!("Some warm-up passes were aborted");
    }
    cache.shutdown().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts the sweep.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    sweep_handle.abort();
    warn!("Expiry sweep aborted");
}
