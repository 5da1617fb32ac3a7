//! Lead export web server.

use graph_client::GraphClient;
use leads_web::{app, AppState, Config};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        addr = %config.addr,
        accounts = %config.accounts_path.display(),
        mode = ?config.store_mode,
        "Starting lead export server"
    );

    let graph = GraphClient::new(config.graph.clone())?;
    let shutdown = CancellationToken::new();
    let state = AppState::from_config(&config, graph, shutdown.clone());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "Lead export server listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Lead export server stopped");
    Ok(())
}

/// Wait for Ctrl-C, then cancel in-flight fetch pauses.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
    shutdown.cancel();
}
