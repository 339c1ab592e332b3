//! OCM console API server

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use ocm_console_api::config::ConsoleConfig;
use ocm_console_api::kubernetes::K8sClient;
use ocm_console_api::shutdown::{ShutdownCoordinator, TaskShutdown};
use ocm_console_api::{build_router, AppState, HubClients};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--sample-config") {
        print!("{}", ConsoleConfig::generate_sample());
        return Ok(());
    }

    let config = ConsoleConfig::load().context("Invalid configuration")?;
    let _log_guard = config.logging.init()?;
    info!("Configuration loaded successfully");

    let client = K8sClient::connect(&config.kubernetes)
        .await
        .context("Failed to connect to the hub cluster")?;
    info!(api_server = %client.api_server(), "Connected to hub cluster");

    let shutdown = ShutdownCoordinator::with_timeout(std::time::Duration::from_secs(
        config.server.shutdown_timeout_secs,
    ));
    let addr = config.listen_addr();
    let poll_interval = config.cache.poll_interval();

    let state = AppState::new(config, HubClients::from_client(client), shutdown.clone());

    let mut tasks = TaskShutdown::new();
    match poll_interval {
        Some(interval) => {
            let handle = state
                .bare_metal
                .start_polling(interval, shutdown.cancel_token());
            tasks.register("bare-metal-asset-poller", handle);
        }
        None => warn!("Bare metal asset polling disabled"),
    }

    let app = build_router(state);

    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("OCM console API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.signal())
        .await?;

    info!("Server stopped, running cleanup...");
    tasks.join_all(shutdown.timeout()).await;
    info!("Cleanup complete, exiting");

    Ok(())
}
