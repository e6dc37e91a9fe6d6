mod config;
mod logging;
mod statsd;

use aggregator::errors::AggregatorError;
use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(version, about = "Fans out concurrent calls to a data service and aggregates them")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run the gateway
    Gateway(ConfigArgs),
    /// Load and validate the config file, then exit
    CheckConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long, short = 'c', default_value = "gateway.yaml")]
    config_file_path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] logging::LoggingError),
    #[error(transparent)]
    Metrics(#[from] statsd::MetricsError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("gateway error: {0}")]
    Gateway(#[from] AggregatorError),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        CliCommand::Gateway(args) => run_gateway(&args),
        CliCommand::CheckConfig(args) => check_config(&args),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1);
    }
}

fn check_config(args: &ConfigArgs) -> Result<(), CliError> {
    Config::from_file(&args.config_file_path)?;
    println!("{}: ok", args.config_file_path.display());
    Ok(())
}

fn run_gateway(args: &ConfigArgs) -> Result<(), CliError> {
    let config = Config::from_file(&args.config_file_path)?;

    // Sentry must be initialised before the runtime starts its threads
    let _sentry_guard = logging::init(&config.common.logging)?;

    if let Some(metrics_config) = &config.common.metrics {
        statsd::init(metrics_config)?;
    }

    tracing::info!(config = %args.config_file_path.display(), "Starting gateway");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(aggregator::run(config.gateway))?;

    Ok(())
}
