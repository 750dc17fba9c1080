//! Configuration management.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "STS_HINTS_CONFIG";

/// Hint list file used when none is configured.
pub const DEFAULT_HINTS_FILE: &str = "mta-sts-hints.txt";

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Hint list updated by `bulk-add`.
    #[serde(default = "default_hints_file")]
    pub hints_file: PathBuf,

    /// Minimum accepted policy `max_age` in seconds.
    #[serde(default = "default_min_max_age")]
    pub min_max_age: u64,

    /// Concurrent policy lookups.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Policy fetch timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Default output format.
    pub output_format: Option<OutputFormat>,

    /// Show a progress bar during discovery.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hints_file: default_hints_file(),
            min_max_age: default_min_max_age(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            output_format: None,
            show_progress: true,
        }
    }
}

fn default_hints_file() -> PathBuf {
    PathBuf::from(DEFAULT_HINTS_FILE)
}

const fn default_min_max_age() -> u64 {
    sts_hints_core::ONE_WEEK_IN_SECONDS
}

const fn default_concurrency() -> usize {
    sts_hints_workflow::config::DEFAULT_CONCURRENCY
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Get the config file path.
    ///
    /// `STS_HINTS_CONFIG` wins over the platform config directory.
    pub fn path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        let dirs = ProjectDirs::from("org", "sts-hints", "sts-hints")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from `path`, falling back to defaults if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {e}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Update a single key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "hints_file" | "hints" => self.hints_file = PathBuf::from(value),
            "min_max_age" => self.min_max_age = value.parse()?,
            "concurrency" => {
                let concurrency: usize = value.parse()?;
                anyhow::ensure!(concurrency > 0, "concurrency must be at least 1");
                self.concurrency = concurrency;
            }
            "timeout_secs" | "timeout" => self.timeout_secs = value.parse()?,
            "output_format" | "output" => self.output_format = Some(value.parse()?),
            "show_progress" => self.show_progress = value.parse()?,
            _ => anyhow::bail!(
                "Unknown config key: {}\n\n\
                 Available keys:\n  \
                 hints_file     - Hint list updated by bulk-add\n  \
                 min_max_age    - Minimum policy max_age in seconds\n  \
                 concurrency    - Concurrent policy lookups\n  \
                 timeout_secs   - Policy fetch timeout in seconds\n  \
                 output_format  - Default output format (pretty/json/csv/yaml)\n  \
                 show_progress  - Show a progress bar (true/false)",
                key
            ),
        }
        Ok(())
    }
}
