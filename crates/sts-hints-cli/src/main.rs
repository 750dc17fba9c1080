//! sts-hints - MTA-STS hint list curation

use std::process::ExitCode;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    sts_hints_cli::run().await
}
