mod commands;

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{LevelFilter, info};
use std::path::PathBuf;

use benchwire::config::{AppConfig, TransportConfig, load_config, load_config_or_default};

use crate::commands::{Cc1Command, MhsCommand, Output};

/// Bench instrument control tool
#[derive(Parser, Debug)]
#[command(name = "benchctl")]
#[command(about = "Read and write MHS5200 / CC1 settings over a serial link", long_about = None)]
struct Args {
    /// Path to configuration file (defaults to ./benchwire.toml if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    device: Device,
}

#[derive(Subcommand, Debug)]
enum Device {
    /// MingHe MHS5200 signal generator
    Mhs5200 {
        #[command(subcommand)]
        command: MhsCommand,
    },
    /// Qubitekk CC1 coincidence counter
    Cc1 {
        #[command(subcommand)]
        command: Cc1Command,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // An explicit --config must load; otherwise fall back to defaults.
    let config = match &args.config {
        Some(path) => load_config(Some(path.as_path()))?,
        None => load_config_or_default(None),
    };

    let log_level = args
        .log_level
        .clone()
        .unwrap_or(config.logging.log_level.clone());
    initialize_logging(&log_level)?;
    log_startup_info(&config);

    let output = Output { json: args.json };
    match args.device {
        Device::Mhs5200 { command } => commands::run_mhs5200(&config, command, output),
        Device::Cc1 { command } => commands::run_cc1(&config, command, output),
    }
}

fn initialize_logging(log_level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => {
            eprintln!("Warning: Invalid log level '{}', using 'info'", log_level);
            LevelFilter::Info
        }
    };

    env_logger::Builder::from_env(Env::default())
        .filter_level(level)
        .format_timestamp_millis()
        .init();

    Ok(())
}

fn log_startup_info(config: &AppConfig) {
    match &config.transport {
        TransportConfig::Serial {
            port, baud_rate, ..
        } => info!("Transport: serial {} @ {} baud", port, baud_rate),
        TransportConfig::Tcp { address, .. } => info!("Transport: tcp {}", address),
    }
}
