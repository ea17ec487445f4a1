//! Funnelscope - funnel conversion and cohort retention reports
//!
//! # Usage
//!
//! ```bash
//! # Everything: funnel summary, both retention tables, quality warnings
//! funnelscope run --source data/events
//!
//! # Per-user funnel table
//! funnelscope funnel --source data/events --format csv
//! funnelscope funnel --source data/events --summary --device mobile
//!
//! # Retention
//! funnelscope retention weekly --source data/events --min-cohort-size 50
//! funnelscope retention daily --source data/events --range 2021-01-01,2021-01-31
//!
//! # Data-quality checks (non-zero exit on warnings)
//! funnelscope validate --config funnelscope.toml
//! ```

mod cmd;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use funnelscope_config::{Config, LogFormat, LogLevel};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default config file, used when present and no --config is given
const DEFAULT_CONFIG_PATH: &str = "funnelscope.toml";

/// Funnelscope - funnel conversion and cohort retention reports
#[derive(Parser, Debug)]
#[command(name = "funnelscope")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full analysis
    Run(cmd::run::RunArgs),

    /// Per-user funnel progression
    Funnel(cmd::funnel::FunnelArgs),

    /// Cohort retention tables
    Retention(cmd::retention::RetentionArgs),

    /// Run the analysis and report data-quality warnings
    Validate(cmd::validate::ValidateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let log_level = resolve_log_level(cli.log_level, &config);
    init_logging(log_level, config.log.format)?;

    match cli.command {
        Command::Run(args) => cmd::run::run(args, &config).await,
        Command::Funnel(args) => cmd::funnel::run(args, &config).await,
        Command::Retention(args) => cmd::retention::run(args, &config).await,
        Command::Validate(args) => cmd::validate::run(args, &config).await,
    }
}

/// Load the config file, or defaults when none is given or found
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display())),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Config::from_file(default)
                    .with_context(|| format!("failed to load config: {}", default.display()))
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<LogLevel>, config: &Config) -> LogLevel {
    cli_level.unwrap_or(config.log.level)
}

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr; stdout carries the report.
fn init_logging(level: LogLevel, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level.directive())
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Console => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}
