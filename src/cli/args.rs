//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ghload - Stale-while-revalidate script loader
///
/// Runs a script from a GitHub repository out of a local cache and
/// refreshes the cache in the background for the next run.
#[derive(Parser, Debug)]
#[command(name = "ghload")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "GHLOAD_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the script, serving the cached copy when there is one
    Run(RunArgs),

    /// Show what is cached for a script, without network access
    Status(StatusArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Which script to load; falls back to the `[source]` config table
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Repository as OWNER/REPO or OWNER/REPO@BRANCH
    pub target: Option<String>,

    /// Path of the script inside the repository (default: main.js)
    #[arg(short, long)]
    pub file: Option<String>,

    /// Branch to track (default: main)
    #[arg(short, long)]
    pub branch: Option<String>,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Interpreter the script is piped into
    #[arg(short, long)]
    pub interpreter: Option<String>,

    /// Extra interpreter argument (repeatable)
    #[arg(long = "arg", allow_hyphen_values = true)]
    pub interpreter_args: Vec<String>,

    /// Exit right after running, without waiting for the background update
    #[arg(long)]
    pub no_wait: bool,

    /// Cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for the status command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}
