//! # Relay Cover Bridge Binary
//!
//! # Usage
//!
//! ```bash
//! # Commands on stdin, relay publishes on stdout, logs on stderr
//! relay_cover_bridge --config covers.toml | mosquitto_pub -l ...
//!
//! # Persist positions and log verbosely as JSON
//! relay_cover_bridge -c covers.toml --state-file /var/lib/relay_cover/positions.bin -v --json
//! ```

use clap::Parser;
use relay_cover_common::config::{LogLevel, load_config};
use relay_cover_common::consts::{DEFAULT_CONFIG_PATH, DEFAULT_STATE_FILE};
use relay_cover_engine::MonotonicClock;
use relay_cover_bridge::{Bridge, BridgeError, BridgeOptions, LineChannel};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Relay cover bridge - time-based position control for relay-driven covers
#[derive(Parser, Debug)]
#[command(name = "relay_cover_bridge")]
#[command(version)]
#[command(about = "Time-based position estimation and control for relay-operated covers")]
#[command(long_about = None)]
struct Args {
    /// Path to the covers configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Persist cover positions to this file (overrides runtime.state_file).
    /// A directory gets the default file name appended.
    #[arg(long, value_name = "FILE")]
    state_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("FATAL: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), BridgeError> {
    let loaded = load_config(&args.config);
    let default_level = loaded
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, default_level);

    let config = loaded?;
    info!(
        "{} v{} starting with {} covers from {:?}",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION"),
        config.covers.len(),
        args.config
    );

    let state_file = args
        .state_file
        .or(config.runtime.state_file.clone())
        .map(|path| {
            if path.is_dir() {
                path.join(DEFAULT_STATE_FILE)
            } else {
                path
            }
        });
    let options = BridgeOptions {
        report_interval: config.runtime.report_interval(),
        state_file,
    };

    let mut bridge = Bridge::new(
        config.covers,
        options,
        MonotonicClock,
        Arc::new(LineChannel::stdout()),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(bridge.run(BufReader::new(tokio::io::stdin()), shutdown_signal()))?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received shutdown signal"),
        Err(e) => {
            error!("unable to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}

/// Setup tracing subscriber based on CLI arguments.
///
/// `RUST_LOG` wins over the configured level; `--verbose` forces DEBUG.
fn setup_tracing(args: &Args, default_level: LogLevel) {
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.as_str()))
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}
