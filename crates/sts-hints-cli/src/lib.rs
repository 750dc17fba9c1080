//! # sts-hints-cli
//!
//! Command-line front end for curating the MTA-STS hint list.
//!
//! ## Commands
//!
//! - **bulk-add**: look up candidate domains and append the qualifying ones
//! - **check**: verify a proposed change to the list, exit 0 when acceptable
//! - **config**: show or edit the TOML configuration
//!
//! Reports render as pretty text, JSON, CSV or YAML.

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
