//! Ramp Experiment Server
//!
//! Drives the ramp of the ramp experiment: loads the configuration, sets up
//! logging and the A4988 stepper driver, then moves the ramp to the angles
//! entered on standard input.
//!
//! The configuration file is taken from `--config`, then the
//! `RAMP_EXPERIMENT_CONFIG` environment variable, then the default location.
//! A missing file is created with the default content.

mod config;
mod hardware;
mod mqtt;
mod session;
mod shutdown;

use anyhow::{Context, Result};
use clap::Parser;
use mqtt::Records;
use ramp_core::config::LoggingConfig;
use ramp_core::{default_config_path, StaticConfig, Status};
use ramp_hardware::{OutputPin, Ramp, SYSFS_GPIO_ROOT};
use session::{Exit, Session};
use std::fs::OpenOptions;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Ramp Experiment Server
#[derive(Parser, Debug)]
#[command(name = "rampd")]
#[command(version, about = "Ramp experiment controller", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable mock mode (run without hardware for testing/development)
    #[arg(long)]
    mock: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,

    /// Use GPIO pins even if they are already exported by another program
    #[arg(long)]
    ignore_busy: bool,

    /// sysfs GPIO directory
    #[arg(long, default_value = SYSFS_GPIO_ROOT)]
    gpio_root: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Determine config path: CLI flag > env var > default
    let config_path = args.config.clone().unwrap_or_else(|| {
        std::env::var("RAMP_EXPERIMENT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path())
    });

    let static_config = config::load(&config_path)
        .await
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    init_tracing(&static_config.logging, args.verbose)?;

    info!("Ramp experiment server starting...");
    info!("Configuration file: {}", config_path.display());
    config::log_summary(&static_config);

    if args.check {
        info!("Configuration is valid");
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown::spawn_signal_listener(shutdown_tx);

    if args.mock {
        let ramp = hardware::mock_ramp(&static_config).await?;
        serve(ramp, &static_config, shutdown_rx).await
    } else {
        let ramp = hardware::open_ramp(&static_config, &args.gpio_root, args.ignore_busy)
            .await
            .context("Failed to set up the A4988 driver. Use --mock for testing without hardware.")?;
        serve(ramp, &static_config, shutdown_rx).await
    }
}

/// Run the interactive session, then park the ramp whatever the outcome
async fn serve<P: OutputPin>(
    mut ramp: Ramp<P>,
    config: &StaticConfig,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let records = Records::new(&config.mqtt, &config.topics);
    let input = spawn_stdin_reader();

    info!("Server ready!");
    let result = Session::new(&mut ramp, &records, tokio::io::stdout(), shutdown_rx)
        .run(input)
        .await;

    match &result {
        Ok(Exit::EndOfInput) => info!("Input closed"),
        Ok(Exit::Shutdown) => info!("Shutdown requested"),
        Err(e) => warn!("Session failed: {}", e),
    }

    shutdown::park(ramp).await;
    records.emit(&records.status(Status::Offline));
    info!("Server shutdown complete");

    result.map(|_| ()).map_err(Into::into)
}

/// Read stdin on a dedicated thread so a pending read never blocks shutdown
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Filter directives derived from `[logging]`
///
/// `--verbose` turns on debug output everywhere.
fn filter_directives(logging: &LoggingConfig, verbose: bool) -> String {
    if verbose {
        return "debug".to_string();
    }
    format!(
        "{},rampd::mqtt={}",
        logging.server_level.as_directive(),
        logging.mqtt_level.as_directive()
    )
}

/// Initialize tracing subscriber for logging
///
/// `RUST_LOG` takes precedence over the configured levels.
fn init_tracing(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(logging, verbose)));

    let (stderr_layer, file_layer) = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let layer = fmt::layer().with_ansi(false).with_writer(Arc::new(file));
            (None, Some(layer))
        }
        None => (Some(fmt::layer().with_writer(std::io::stderr)), None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}
