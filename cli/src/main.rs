//! CLI entrypoint for llm-council
//!
//! This is the server binary that wires together all layers using
//! dependency injection: config, session store, bridge, use cases,
//! tracker, and the HTTP + WebSocket surface.

use anyhow::{Context, Result};
use clap::Parser;
use council_application::{DeliberationTracker, SubmitCouncilUseCase};
use council_infrastructure::{AppState, ConfigLoader, CouncilBridge, FileSessionStore, serve};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "llm-council",
    about = "Bridge between HTTP callers and a council of browser AI providers",
    version
)]
struct Cli {
    /// Path to an explicit config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ignore config files and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Override the configured bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured port
    #[arg(short, long)]
    port: Option<u16>,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // The non-blocking writer guard must outlive the server.
    let _log_guard = match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "llm-council.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
            None
        }
    };

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|error| anyhow::anyhow!("failed to load configuration: {error}"))?
    };

    let host = cli.host.unwrap_or_else(|| config.server.host.clone());
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    info!("starting llm-council");

    // === Dependency injection ===
    let store = Arc::new(
        FileSessionStore::open(config.sessions.resolved_path(), config.sessions.capacity)
            .await
            .context("failed to open session store")?,
    );
    let bridge = Arc::new(CouncilBridge::new());
    let submit = Arc::new(
        SubmitCouncilUseCase::new(Arc::clone(&bridge))
            .with_timeouts(config.bridge.timeout_policy()),
    );

    // Mirror the live event stream into persisted session snapshots.
    let tracker = Arc::new(DeliberationTracker::new(Arc::clone(&store)));
    tokio::spawn(Arc::clone(&tracker).run(bridge.subscribe()));

    let state = AppState::new(Arc::clone(&bridge), submit, store);

    // Ctrl-C drives graceful shutdown.
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        });
    }

    serve(&addr, state, shutdown).await?;
    Ok(())
}
