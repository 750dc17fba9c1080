//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Curate and verify the MTA-STS hint list
///
/// The hint list names domains that publish an MTA-STS policy in enforce
/// mode with a long max_age. `bulk-add` discovers new entries, `check`
/// verifies a proposed change to the list.
#[derive(Parser, Debug)]
#[command(name = "sts-hints")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Config file (default: platform config directory)
    #[arg(long, global = true, env = "STS_HINTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Concurrent policy lookups
    #[arg(short = 'j', long, global = true, value_parser = clap::value_parser!(u64).range(1..=256))]
    pub concurrency: Option<u64>,

    /// Policy fetch timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Minimum accepted policy max_age in seconds
    #[arg(long, global = true)]
    pub min_max_age: Option<u64>,

    /// Increase verbosity (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Disable the progress bar
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check candidate domains and add the qualifying ones to the hint list
    BulkAdd(BulkAddArgs),

    /// Verify a proposed change to the hint list
    Check(CheckArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Bulk-add command
// ============================================================================

#[derive(Args, Debug)]
pub struct BulkAddArgs {
    /// File with one candidate domain per line
    pub candidates: PathBuf,

    /// Hint list to update (default: `hints_file` from config)
    #[arg(long)]
    pub hints: Option<PathBuf>,
}

// ============================================================================
// Check command
// ============================================================================

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Current hint list
    pub baseline: PathBuf,

    /// Proposed hint list
    pub proposed: PathBuf,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Key to set (e.g., hints_file, concurrency)
        key: String,

        /// Value to set
        value: String,
    },

    /// Show config file path
    Path,
}
