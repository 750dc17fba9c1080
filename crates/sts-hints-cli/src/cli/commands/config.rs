//! `sts-hints config` - CLI configuration management.

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::output::OutputFormat;

pub async fn execute(ctx: Context, args: ConfigArgs) -> Result<ExitCode> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx)?,
        ConfigCommands::Set { key, value } => set_config(ctx, &key, &value)?,
        ConfigCommands::Path => println!("{}", ctx.config_path.display()),
    }
    Ok(ExitCode::SUCCESS)
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    match ctx.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(config)?),
        _ => {
            println!("{}", "Current Configuration:".bold());
            println!();
            println!("  {} {}", "hints_file:".bold(), config.hints_file.display());
            println!("  {} {}", "min_max_age:".bold(), config.min_max_age);
            println!("  {} {}", "concurrency:".bold(), config.concurrency);
            println!("  {} {}", "timeout_secs:".bold(), config.timeout_secs);
            println!(
                "  {} {}",
                "output_format:".bold(),
                config.output_format.unwrap_or_default()
            );
            println!("  {} {}", "show_progress:".bold(), config.show_progress);
        }
    }

    Ok(())
}

fn set_config(ctx: Context, key: &str, value: &str) -> Result<()> {
    let mut config = ctx.config;
    config.set(key, value)?;
    config.save_to(&ctx.config_path)?;

    println!("{} {} set to {}.", "Success:".green().bold(), key, value.cyan());
    Ok(())
}
