//! Storefront Cache - inspection server
//!
//! Hosts the response and image caches behind a small HTTP API, with both
//! sweep timers running for the lifetime of the process.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_cache::api::{create_router, AppState};
use storefront_cache::config::Config;
use storefront_cache::tasks::{spawn_image_sweeper, spawn_response_sweeper, SweepTask};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create both caches with configured parameters
/// 4. Start the response and image sweep timers
/// 5. Serve the inspection API until SIGINT/SIGTERM, then stop the timers
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Storefront Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: response_ttl={}s, image_ttl={}s, image_capacity={}B, image_item_limit={}B, dir={}",
        config.response_ttl,
        config.image_ttl,
        config.image_max_total_bytes,
        config.image_max_item_bytes,
        config.image_cache_dir.display()
    );

    let state = AppState::from_config(&config).context("failed to initialize caches")?;
    info!("Caches initialized");

    let sweepers = vec![
        spawn_response_sweeper(state.responses.clone(), config.response_sweep_interval()),
        spawn_image_sweeper(state.images.clone(), config.image_sweep_interval()),
    ];
    info!("Sweep timers started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweepers))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweep timers.
async fn shutdown_signal(sweepers: Vec<SweepTask>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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

    for sweeper in &sweepers {
        sweeper.stop();
    }
    warn!("Sweep timers stopped");
}
