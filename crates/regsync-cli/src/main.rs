//! regsync CLI - Idempotent spec uploads into an API registry
//!
//! Provides commands for:
//! - Uploading spec files and proto directories into a version
//! - Uploading a whole directory tree of specs
//! - Listing registry resources
//! - Viewing and editing configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use regsync_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{config::ConfigCommand, list::ListCommand, upload::UploadCommand, Context};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "regsync", version, about = "Upload API specs into an API registry")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of concurrent upload workers
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Run against an empty in-memory registry and report what would be created
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload specs into the registry
    #[command(subcommand)]
    Upload(UploadCommand),
    /// List registry resources
    List(ListCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    fn context(&self) -> Context {
        Context {
            format: OutputFormat::from_flag(self.json),
            config_path: self.config.clone(),
            workers: self.workers,
            dry_run: self.dry_run,
        }
    }
}

/// Filter directive from `-v` count, falling back to the configured level
fn log_filter(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = cli.context();

    // Setup tracing
    let configured = Config::load_or_default(&ctx.config_path()).logging.level;
    let filter = log_filter(cli.verbose, &configured);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match &cli.command {
        Commands::Upload(cmd) => cmd.execute(&ctx).await,
        Commands::List(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
    }
}
