//! Command implementations.

pub mod bulk_add;
pub mod check;
pub mod config;

use std::path::PathBuf;
use std::time::Duration;

use sts_hints_resolver::StsResolver;
use sts_hints_workflow::PassConfig;

use crate::config::Config;
use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration file
    pub config: Config,

    /// Where the configuration lives
    pub config_path: PathBuf,

    /// Output format
    pub output_format: OutputFormat,

    /// Concurrent policy lookups
    pub concurrency: usize,

    /// Policy fetch timeout in seconds
    pub timeout_secs: u64,

    /// Minimum accepted policy `max_age`
    pub min_max_age: u64,

    /// Draw a progress bar during discovery
    pub show_progress: bool,
}

impl Context {
    /// Settings for a discovery or verification pass.
    pub fn pass_config(&self) -> PassConfig {
        PassConfig::new()
            .min_max_age(self.min_max_age)
            .concurrency(self.concurrency)
    }

    /// Create the live MTA-STS resolver.
    pub fn resolver(&self) -> anyhow::Result<StsResolver> {
        let resolver = StsResolver::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;
        Ok(resolver)
    }
}
