//! Results review (vrq-dr) - Main entry point
//!
//! Read-only, password-protected view over questionnaire results.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use vrq_common::config::{load_config, SinkConfig};
use vrq_common::logging;
use vrq_dr::{build_router, AppState};

/// Command-line arguments for vrq-dr
#[derive(Parser, Debug)]
#[command(name = "vrq-dr")]
#[command(about = "Results review for the vehicle realism questionnaire")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "VRQ_DR_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(long, env = "VRQ_BIND_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let level_handle = logging::init_tracing("vrq_dr");

    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    logging::apply_level(level_handle.as_ref(), "vrq_dr", &config.logging.level);

    info!(
        "Starting vrq-dr (Results Review) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let results_path = match &config.sink {
        SinkConfig::Csv { path } => {
            info!("Results file: {}", path.display());
            Some(path.clone())
        }
        SinkConfig::RemoteForm { .. } => {
            warn!("Results go to a remote form endpoint; summaries are unavailable");
            None
        }
    };

    if config.admin_password.is_none() {
        warn!("No admin password configured; protected routes will answer 503");
    }

    let state = AppState::new(results_path, config.admin_password.as_deref());
    let app = build_router(state);

    let host = args.host.unwrap_or_else(|| config.bind_host.clone());
    let port = args.port.unwrap_or(config.dr_port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("vrq-dr stopped");
    Ok(())
}

/// Graceful shutdown signal handler
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
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
