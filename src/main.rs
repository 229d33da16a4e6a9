//! ghload - Stale-while-revalidate script loader
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use ghload::cli::{Cli, Commands};
use ghload::config::{Config, ConfigManager};
use ghload::error::LoaderResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{} failed to start runtime: {}", style("Error:").red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run());

    // A background update still in flight is discarded, never awaited
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> LoaderResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Config is loaded before logging is up so log_format can apply
    let config = config_manager.load().await?;
    init_logging(cli.verbose, &config);
    debug!("Loaded config from {}", config_manager.path().display());

    match cli.command {
        Commands::Run(args) => ghload::cli::commands::run(args, &config).await,
        Commands::Status(args) => ghload::cli::commands::status(args, &config).await,
        Commands::Config(args) => {
            ghload::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("ghload=warn"),
        1 => EnvFilter::new("ghload=info"),
        _ => EnvFilter::new("ghload=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
