//! `sts-hints check` - verify a proposed hint list change.

use std::process::ExitCode;

use anyhow::Result;
use sts_hints_workflow::Verifier;

use super::Context;
use crate::cli::args::CheckArgs;
use crate::output::{render_verification, render_verification_error};

pub async fn execute(ctx: Context, args: CheckArgs) -> Result<ExitCode> {
    let verifier = Verifier::with_config(ctx.resolver()?, ctx.pass_config());

    match verifier.verify_files(&args.baseline, &args.proposed).await {
        Ok(report) => {
            print!("{}", render_verification(&report, ctx.output_format)?);
            Ok(ExitCode::from(report.exit_code()))
        }
        Err(err) => {
            tracing::debug!(error = %err, "verification aborted");
            print!("{}", render_verification_error(&err, ctx.output_format)?);
            Ok(ExitCode::FAILURE)
        }
    }
}
