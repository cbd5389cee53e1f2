//! Cache Engine server - exposes the typed expiring cache over HTTP
//!
//! Strings, counters, sets and hashes with TTL expiration, reclaimed lazily
//! on access and by a budgeted background task.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_engine::api::{create_router, AppState};
use cache_engine::{Config, Lifecycle};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache store, starting the reclaimer if enabled
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM, stop serving and run shutdown hooks
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_engine=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cache engine server");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        active_cleaning = config.engine.enable_active_cleaning,
        clean_interval_s = config.engine.clean_interval_seconds,
        max_clean_us = config.engine.max_clean_microseconds,
        max_clean_pct = config.engine.max_clean_percentage,
        "Configuration loaded"
    );

    let lifecycle = Arc::new(Lifecycle::new());
    let state = AppState::from_config(&config, &lifecycle)
        .context("failed to initialize cache store")?;
    info!("Cache store initialized");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&lifecycle)))
        .await
        .context("server error")?;

    // Covers the case where serving ended without a signal
    lifecycle.shutdown();
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then runs the
/// registered shutdown hooks.
async fn shutdown_signal(lifecycle: Arc<Lifecycle>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    let hooks = lifecycle.shutdown();
    info!(hooks, "Shutdown hooks completed");
}
