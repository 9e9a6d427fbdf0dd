//! Storefront Cache admin server
//!
//! Hosts one cache instance with its expiration sweep and exposes the
//! back-office cache panel over HTTP.

use std::net::SocketAddr;

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_cache::{api::create_router, spawn_cleanup_task, warm_up, AppState, Config};

/// Main entry point for the cache admin server.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables
/// 2. Initialize tracing subscriber (debug level when `CACHE_DEBUG` is set)
/// 3. Create the cache and start the expiration sweep
/// 4. Run the warm-up plan
/// 5. Serve the admin router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // RUST_LOG wins over the CACHE_DEBUG default
    let default_filter = if config.debug {
        "storefront_cache=debug,tower_http=debug"
    } else {
        "storefront_cache=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting storefront cache");
    info!(
        "Configuration loaded: max_entries={}, default_ttl={}s, check_period={}s, single_flight={}, port={}",
        config.max_entries,
        config.default_ttl,
        config.check_period,
        config.single_flight,
        config.server_port
    );

    let state = AppState::from_config(&config);
    let sweep_handle = spawn_cleanup_task(state.cache.clone(), config.check_period);

    // Embedding hosts register their fetchers via AppState::with_warmup
    warm_up(&state.cache, &state.warmup).await;

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Admin API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task and allows graceful shutdown.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
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

    sweep_handle.abort();
    warn!("Expiration sweep aborted");
}
