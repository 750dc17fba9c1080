//! `sts-hints bulk-add` - discover qualifying domains and append them.

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sts_hints_workflow::{read_candidates, CandidateOutcome, Curator};

use super::Context;
use crate::cli::args::BulkAddArgs;
use crate::output::render_curation;

/// Conventional exit status after SIGINT.
const INTERRUPTED: u8 = 130;

pub async fn execute(ctx: Context, args: BulkAddArgs) -> Result<ExitCode> {
    let candidates = read_candidates(&args.candidates)
        .with_context(|| format!("Failed to read candidates from {}", args.candidates.display()))?;
    let hints = args.hints.unwrap_or_else(|| ctx.config.hints_file.clone());

    tracing::info!(
        candidates = candidates.len(),
        hints = %hints.display(),
        concurrency = ctx.concurrency,
        "starting discovery"
    );

    let curator = Curator::with_config(ctx.resolver()?, ctx.pass_config());
    let progress = progress_bar(&ctx, candidates.len())?;

    let run = curator.run_file_with(&candidates, &hints, |record| {
        if matches!(record.outcome, CandidateOutcome::Included) {
            progress.set_message(record.domain.clone());
        }
        progress.inc(1);
    });

    let report = tokio::select! {
        report = run => report?,
        _ = tokio::signal::ctrl_c() => {
            progress.abandon();
            eprintln!(
                "{} interrupted, {} left unchanged",
                "Warning:".yellow().bold(),
                hints.display()
            );
            return Ok(ExitCode::from(INTERRUPTED));
        }
    };
    progress.finish_and_clear();

    print!("{}", render_curation(&report, ctx.output_format)?);

    Ok(ExitCode::SUCCESS)
}

fn progress_bar(ctx: &Context, len: usize) -> Result<ProgressBar> {
    if !ctx.show_progress {
        return Ok(ProgressBar::hidden());
    }

    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/dim}] {pos}/{len} {msg}")?
            .progress_chars("━━╸"),
    );
    Ok(bar)
}
