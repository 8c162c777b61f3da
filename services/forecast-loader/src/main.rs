//! Township weather forecast loader.
//!
//! Fetches the forecast feed, flattens it into per-window records and loads
//! them into SQLite and a CSV export, either once or on a poll interval.

mod config;
mod scheduler;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::{load_config, Overrides};
use scheduler::Scheduler;

#[derive(Parser, Debug)]
#[command(name = "forecast-loader")]
#[command(about = "Township weather forecast ETL into SQLite and CSV")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, env = "FORECAST_CONFIG", default_value = "config/forecast.yaml")]
    config: PathBuf,

    /// Run once and exit (vs continuous polling)
    #[arg(long)]
    once: bool,

    /// Load a saved feed payload instead of calling the endpoint (implies --once)
    #[arg(long)]
    input: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, env = "FORECAST_DB_PATH")]
    db_path: Option<PathBuf>,

    /// CSV export path
    #[arg(long, env = "FORECAST_CSV_PATH")]
    csv_path: Option<PathBuf>,

    /// Authorization key for the forecast endpoint
    #[arg(long, env = "CWA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Skip TLS certificate validation for the feed
    #[arg(long)]
    accept_invalid_certs: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting forecast loader");

    let overrides = Overrides {
        api_key: args.api_key.clone(),
        db_path: args.db_path.clone(),
        csv_path: args.csv_path.clone(),
        accept_invalid_certs: args.accept_invalid_certs,
    };
    let config = overrides.apply(load_config(&args.config)?);
    config.validate()?;

    info!(
        url = %config.feed.url,
        store = %config.store.path.display(),
        export = %config.export.path.display(),
        authorized = config.feed.api_key.is_some(),
        "Forecast loader configured"
    );

    let scheduler = Scheduler::new(&config)?;

    if let Some(input) = &args.input {
        let summary = scheduler.run_input(input).await?;
        if !summary.is_success() {
            bail!(
                "forecast load from {} failed: store {}, export {}",
                input.display(),
                summary.store,
                summary.export
            );
        }
    } else if args.once {
        info!("Running single forecast cycle");

        let summary = scheduler.run_once().await?;
        if !summary.is_success() {
            bail!(
                "forecast run failed: store {}, export {}",
                summary.store,
                summary.export
            );
        }
    } else {
        // Shutdown signal
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        // Handle Ctrl+C
        let shutdown_tx_clone = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal");
            shutdown_tx_clone.send(()).ok();
        });

        scheduler.run_forever(shutdown_tx.subscribe()).await?;
    }

    info!("Forecast loader finished");
    Ok(())
}
