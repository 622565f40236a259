//! Speedrun Service binary — loads configuration from the environment,
//! builds the [`speedrun_core::Orchestrator`], and runs it until a shutdown
//! signal arrives. Grounded in `solver_service::main`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use speedrun_config::Config;
use speedrun_core::Orchestrator;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "speedrun")]
#[command(about = "Speedrun cross-chain intent indexer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the indexer: ingestion workers, supervisor, metrics, and the read API.
    Start,
    /// Load and validate configuration from the environment without starting services.
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Validate) => validate().await,
        Some(Commands::Start) | None => start().await,
    }
}

async fn start() -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    setup_tracing(&config.log_level, config.log_json)?;

    info!(port = config.port, metrics_port = config.metrics_port, chains = config.chains.len(), "starting speedrun indexer");

    let orchestrator = Orchestrator::build(config).await.context("failed to build orchestrator")?;
    orchestrator.start().await.context("failed to start orchestrator")?;

    shutdown_signal().await;
    info!("shutdown signal received, stopping services");

    orchestrator.shutdown().await.context("failed to shut down orchestrator")?;
    info!("speedrun indexer stopped");
    Ok(())
}

async fn validate() -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    setup_tracing(&config.log_level, config.log_json)?;

    info!("configuration is valid");
    info!(chains = config.chains.len(), "configured chains");
    for endpoint in config.chains.values() {
        info!(name = %endpoint.name, rpc_url = %endpoint.rpc_url, "chain endpoint");
    }
    Ok(())
}

fn setup_tracing(log_level: &str, json: bool) -> Result<()> {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
