//! blockwatch Binary Entry Point
//!
//! Runs the collector loop and the HTTP query server side by side.
//! Core functionality is provided by the `blockwatch` library crate.

use std::time::Duration;

use blockwatch::{
    AppConfig, Collector, QueryService, StorageHandles,
    config::parse_duration,
    server::{AppState, create_router},
};
use clap::Parser;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// blockwatch - Blockchain Metrics Sampler
#[derive(Parser, Debug)]
#[command(name = "blockwatch", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "BLOCKWATCH_CONFIG"
    )]
    config: String,

    /// Server bind address (overrides config file)
    #[arg(long, env = "BLOCKWATCH_SERVER_BIND")]
    server_bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "BLOCKWATCH_SERVER_PORT")]
    server_port: Option<u16>,

    /// Database file path (overrides config file)
    #[arg(long, env = "BLOCKWATCH_DB_PATH")]
    db_path: Option<String>,

    /// Metrics probe program (overrides config file)
    #[arg(long, env = "BLOCKWATCH_PROBE_COMMAND")]
    probe_command: Option<String>,

    /// Collection interval, e.g. "60s" (overrides config file)
    #[arg(long, env = "BLOCKWATCH_INTERVAL", value_parser = parse_duration)]
    interval: Option<Duration>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,blockwatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("blockwatch - Blockchain Metrics Sampler");

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file
    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(bind) = cli.server_bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.server_port {
        config.server.port = port;
    }
    if let Some(path) = cli.db_path {
        config.database.path = path;
    }
    if let Some(command) = cli.probe_command {
        config.probe.command = command;
    }
    if let Some(interval) = cli.interval {
        config.collector.interval = interval;
    }
    config.validate()?;

    tracing::info!(
        "Server: {}:{}, Database: {}, Probe: {}, Interval: {:?}",
        config.server.bind,
        config.server.port,
        config.database.path,
        config.probe.command,
        config.collector.interval,
    );

    // Build storage layer
    let handles = config.database.storage_builder().build().await?;
    tracing::info!("Storage initialized");

    // Start collector
    let cancel = CancellationToken::new();
    let collector = Collector::new(
        config.probe.to_probe(),
        handles.writer.clone(),
        config.collector.interval,
    );
    let collector_task = collector.spawn(cancel.clone());

    // Build Axum router
    let app = create_router(AppState {
        query: QueryService::new(handles.reader.clone()),
    });

    let addr = config.bind_addr()?;
    tracing::info!("Web server listening on: http://{}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    // Server may also stop on its own; make sure the collector follows.
    cancel.cancel();
    shutdown(collector_task, handles).await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then cancel background work.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
        _ = cancel.cancelled() => {}
    }

    cancel.cancel();
}

/// Stop the collector, then the storage layer.
async fn shutdown(collector_task: JoinHandle<()>, handles: StorageHandles) {
    tracing::info!("Shutting down collector...");
    if let Err(e) = collector_task.await {
        tracing::error!("Collector task failed: {}", e);
    }

    tracing::info!("Shutting down storage...");
    if let Err(e) = handles.shutdown().await {
        tracing::error!("Failed to shutdown storage: {}", e);
    }
}
