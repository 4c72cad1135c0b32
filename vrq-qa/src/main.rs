//! Vehicle Realism Questionnaire (vrq-qa) - Main entry point
//!
//! Participant-facing web service: shows each participant a random sample
//! of image pairs, collects 4-point realism ratings and flushes them to the
//! configured result sink when the participant finishes.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use vrq_common::config::load_config;
use vrq_common::logging;
use vrq_common::{QuestionPool, ResultSink, Survey};
use vrq_qa::sessions::SessionRegistry;
use vrq_qa::{build_router, AppState};

/// Command-line arguments for vrq-qa
#[derive(Parser, Debug)]
#[command(name = "vrq-qa")]
#[command(about = "Vehicle realism questionnaire service")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "VRQ_QA_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(long, env = "VRQ_BIND_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let level_handle = logging::init_tracing("vrq_qa");

    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    logging::apply_level(level_handle.as_ref(), "vrq_qa", &config.logging.level);

    info!(
        "Starting vrq-qa (Vehicle Realism Questionnaire) v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Plain images: {}", config.image_dir.display());
    info!("Annotated images: {}", config.annotated_image_dir.display());

    let pool = QuestionPool::scan(&config.image_dir, &config.annotated_image_dir, config.pairing)
        .context("Failed to build question pool")?;
    if pool.is_empty() {
        warn!("Question pool is empty; participants will see a notice instead of questions");
    }

    let sink = ResultSink::from_config(&config.sink).context("Failed to create result sink")?;
    match sink.results_path() {
        Some(path) => info!("Results file: {}", path.display()),
        None => info!("Results sink: remote form endpoint"),
    }

    let survey = Survey::new(Arc::new(pool), Arc::new(sink), config.questions_per_participant);
    info!(
        "Asking up to {} questions per participant",
        config.questions_per_participant
    );

    let ttl = Duration::from_secs(config.session_ttl_secs);
    let sessions = SessionRegistry::new(ttl);
    let _sweeper = sessions.spawn_sweeper(sweep_interval(ttl));

    let state = AppState::new(
        survey,
        sessions,
        config.image_dir.clone(),
        config.annotated_image_dir.clone(),
    );
    let app = build_router(state);

    let host = args.host.unwrap_or_else(|| config.bind_host.clone());
    let port = args.port.unwrap_or(config.qa_port);
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

    info!("vrq-qa stopped");
    Ok(())
}

/// Sweep often enough that a session outlives its TTL by at most a few minutes
fn sweep_interval(ttl: Duration) -> Duration {
    (ttl / 10).clamp(Duration::from_secs(1), Duration::from_secs(300))
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
