//! Report rendering.
//!
//! Pretty output is meant for a terminal; the other formats go to stdout
//! unchanged so they can be piped into other tools.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod report;

pub use report::{render_curation, render_verification, render_verification_error};

/// How reports are written to stdout.
///
/// Also stored in the config file as `output_format`.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated results, colored when stdout allows
    #[default]
    Pretty,
    Json,
    /// One row per domain, with a header row
    Csv,
    Yaml,
}

impl OutputFormat {
    const fn name(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Yaml => "yaml",
        }
    }
}

// Accepts the aliases `text` and `yml` for `config set output ...`
impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => anyhow::bail!("Unknown output format {s:?} (expected pretty, json, csv or yaml)"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
