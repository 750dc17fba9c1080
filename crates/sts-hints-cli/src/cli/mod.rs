//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use std::process::ExitCode;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Run the CLI application.
pub async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load configuration
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::path()?,
    };
    let config = Config::load_from(&config_path)?;
    tracing::debug!(path = %config_path.display(), "loaded configuration");

    // Flags win over the config file
    let output_format = cli.output.or(config.output_format).unwrap_or_default();
    let ctx = commands::Context {
        concurrency: cli
            .concurrency
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(config.concurrency),
        timeout_secs: cli.timeout.unwrap_or(config.timeout_secs),
        min_max_age: cli.min_max_age.unwrap_or(config.min_max_age),
        show_progress: config.show_progress && !cli.no_progress,
        output_format,
        config_path,
        config,
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::BulkAdd(args) => commands::bulk_add::execute(ctx, args).await,
        Commands::Check(args) => commands::check::execute(ctx, args).await,
        Commands::Config(args) => commands::config::execute(ctx, args).await,
    }
}

/// Logs go to stderr so report output on stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
