//! pet-kingdom-board server entry point.
//!
//! Starts the Axum HTTP server and the expiry sweeper, and shuts both down
//! on Ctrl-C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use pet_kingdom_board::api;
use pet_kingdom_board::app_state::AppState;
use pet_kingdom_board::config::{AppConfig, LogFormat};
use pet_kingdom_board::domain::SystemClock;
use pet_kingdom_board::service::ExpirySweeper;
use pet_kingdom_board::{shutdown, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Plain => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.storage_backend,
        "starting pet-kingdom-board"
    );

    // Build storage and application state
    let store = storage::connect(&config).await?;
    let state = AppState::new(Arc::clone(&store), Arc::new(SystemClock), &config);

    // Start the expiry sweeper
    let (stop_sweeper, sweeper_shutdown) = tokio::sync::watch::channel(false);
    let sweeper = ExpirySweeper::new(Arc::clone(&state.pet_registry), config.sweep_interval())
        .start(sweeper_shutdown);

    // Build router
    let app = api::build_app(state, &config);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown::signal())
    .await?;

    // Drain background work and release storage
    let _ = stop_sweeper.send(true);
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "expiry sweeper task ended abnormally");
    }
    store.close().await;
    tracing::info!("shutdown complete");

    Ok(())
}
