//! Polyfade bot entry point.
//!
//! Wires the engine to a dry-run executor. Live feeds and the venue
//! execution client are external collaborators: embed the engine as a
//! library and bridge their events into the engine channel.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use rust_decimal::Decimal;
use tracing::info;

use polyfade_bot::{AppConfig, Engine};
use polyfade_core::Price;
use polyfade_executor::{DryRunExecutor, RetryingExecutor};

/// Spike-fade / train-of-trade decision engine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via POLYFADE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    polyfade_telemetry::init_logging()?;

    info!("Starting polyfade-bot v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args
        .config
        .or_else(|| std::env::var("POLYFADE_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = AppConfig::from_file(&config_path)?;

    if !config.dry_run {
        anyhow::bail!(
            "Live execution requires wiring a venue OrderExecutor; \
             this binary runs in dry-run mode only"
        );
    }

    let dry_run = Arc::new(DryRunExecutor::new(Price::new(Decimal::new(5, 1))));
    let executor = Arc::new(RetryingExecutor::with_defaults(dry_run));

    let (engine, _events_tx, events_rx) = Engine::new(config, executor, None)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let engine_task = tokio::spawn(engine.run(events_rx, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, shutting down");
    let _ = shutdown_tx.send(true);
    let _ = engine_task.await;

    Ok(())
}
