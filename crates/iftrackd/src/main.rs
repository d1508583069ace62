//! Interface inventory daemon
//!
//! Main entry point for iftrackd. Subscribes to kernel link events,
//! maintains the interface registry, and serves snapshots over HTTP.
//!
//! Startup order matters: the event subscription is established first,
//! then the query surface. Failure of either is fatal; the error path
//! unwinds whatever was already established before the process exits
//! with a non-zero status.

use clap::Parser;
use iftrackd::metrics::MetricsCollector;
use iftrackd::query_server::{start_query_server, DEFAULT_QUERY_PORT};
use iftrackd::registry::InterfaceRegistry;
use iftrackd::{IftrackError, LinkSync, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "iftrackd", about = "Network interface inventory daemon")]
struct Args {
    /// Address the query server listens on
    #[arg(long, default_value_t = default_listen_addr())]
    listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], DEFAULT_QUERY_PORT))
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    init_logging(args.log_level)?;

    info!("iftrackd: Starting interface inventory daemon");

    match run_daemon(args).await {
        Ok(()) => {
            info!("iftrackd: Daemon exiting normally");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "iftrackd: Daemon exiting with error");
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}

/// Initialize structured logging
fn init_logging(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| IftrackError::Config(format!("Failed to set logger: {}", e)))?;

    Ok(())
}

/// Main daemon loop
async fn run_daemon(args: Args) -> Result<()> {
    let registry = Arc::new(InterfaceRegistry::new());
    let metrics = MetricsCollector::new()
        .map_err(|e| IftrackError::Config(format!("Failed to create metrics: {}", e)))?;

    // Event subscription first; fatal on failure
    let mut link_sync = LinkSync::new(Arc::clone(&registry), metrics.clone())?;

    // Query surface second; on failure the subscription unwinds when
    // link_sync drops out of this scope
    let query_server = start_query_server(args.listen, Arc::clone(&registry), metrics).await?;

    // Converge the inventory without waiting for link churn
    link_sync.request_dump()?;
    info!("iftrackd: Listening for link events...");

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let event_loop = tokio::spawn(async move {
        link_sync.run(shutdown_rx).await;
    });

    wait_for_shutdown_signal().await;
    info!("iftrackd: Received shutdown signal");

    // Tear down the event subscription before the query surface
    let _ = shutdown_tx.send(true);
    if let Err(e) = event_loop.await {
        warn!(error = %e, "Event loop task failed during shutdown");
    }
    query_server.shutdown().await;

    info!("iftrackd: Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT/SIGTERM
async fn wait_for_shutdown_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
