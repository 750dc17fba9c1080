//! Rendering of discovery and verification reports.

use std::fmt::Write as _;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use sts_hints_core::HintsError;
use sts_hints_workflow::{
    CandidateOutcome, CandidateRecord, CurationReport, Direction, VerificationReport,
};

use super::OutputFormat;

/// Render a discovery report
pub fn render_curation(report: &CurationReport, format: OutputFormat) -> Result<String> {
    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)? + "\n",
        OutputFormat::Yaml => serde_yaml::to_string(report)?,
        OutputFormat::Csv => {
            let mut writer = csv_writer(&["domain", "outcome", "detail"])?;
            for record in &report.records {
                writer.serialize(CurationRow {
                    domain: &record.domain,
                    outcome: record.outcome.to_string(),
                    detail: record
                        .resolution
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                })?;
            }
            finish_csv(writer)?
        }
        OutputFormat::Pretty => {
            let mut out = format!("{}\n", "Results:".bold());
            for record in &report.records {
                writeln!(out, "\t{}\t{}", record.domain, pretty_outcome(record))?;
            }
            writeln!(
                out,
                "\n{} {} included, {} looked up, {} candidates",
                "Summary:".bold(),
                report.included_count().to_string().green().bold(),
                report.resolved_count(),
                report.records.len()
            )?;
            let transient = report.transient_failures().count();
            if transient > 0 {
                writeln!(
                    out,
                    "{}",
                    format!("{transient} lookup(s) failed transiently; rerun later to retry them")
                        .yellow()
                )?;
            }
            out
        }
    };
    Ok(out)
}

fn pretty_outcome(record: &CandidateRecord) -> String {
    let text = record.outcome.to_string();
    match &record.outcome {
        CandidateOutcome::Included => text.green().to_string(),
        CandidateOutcome::Rejected { .. } => match &record.resolution {
            Some(resolution) if resolution.is_transient() => {
                format!("{} ({})", text.yellow(), resolution.to_string().dimmed())
            }
            _ => text.yellow().to_string(),
        },
        CandidateOutcome::AlreadyIncluded | CandidateOutcome::Duplicate => {
            text.dimmed().to_string()
        }
        CandidateOutcome::NotNormalized { .. } | CandidateOutcome::InvalidDomain { .. } => {
            text.red().to_string()
        }
    }
}

/// Render a verification report
pub fn render_verification(report: &VerificationReport, format: OutputFormat) -> Result<String> {
    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)? + "\n",
        OutputFormat::Yaml => serde_yaml::to_string(report)?,
        OutputFormat::Csv => {
            let mut writer = csv_writer(&["domain", "direction", "passed", "diagnostic"])?;
            for check in &report.checks {
                writer.serialize(VerificationRow {
                    domain: &check.domain,
                    direction: check.direction,
                    passed: check.passed(),
                    diagnostic: check.diagnostics.get(1..).unwrap_or_default().join("; "),
                })?;
            }
            finish_csv(writer)?
        }
        OutputFormat::Pretty => {
            let mut out = String::new();
            for check in &report.checks {
                for line in &check.diagnostics {
                    writeln!(out, "  {line}")?;
                }
                if let Some(violation) = &check.violation {
                    writeln!(out, "  {}", violation.to_string().red())?;
                }
            }
            let added = report.diff.added.len();
            let removed = report.diff.removed.len();
            if report.passed() {
                writeln!(
                    out,
                    "{} ({added} added, {removed} removed)",
                    "Change accepted".green().bold()
                )?;
            } else {
                writeln!(
                    out,
                    "{} ({} violation(s))",
                    "Change rejected".red().bold(),
                    report.violations().count()
                )?;
            }
            out
        }
    };
    Ok(out)
}

/// Render an error that aborted verification
pub fn render_verification_error(err: &HintsError, format: OutputFormat) -> Result<String> {
    let message = err.to_string();
    let out = match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&serde_json::json!({ "passed": false, "error": message }))?
                + "\n"
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(&serde_json::json!({ "passed": false, "error": message }))?
        }
        OutputFormat::Csv => {
            let mut writer = csv_writer(&["error"])?;
            writer.write_record([message.as_str()])?;
            finish_csv(writer)?
        }
        OutputFormat::Pretty => format!("  {}\n", message.red()),
    };
    Ok(out)
}

#[derive(Serialize)]
struct CurationRow<'a> {
    domain: &'a str,
    outcome: String,
    detail: String,
}

#[derive(Serialize)]
struct VerificationRow<'a> {
    domain: &'a str,
    direction: Direction,
    passed: bool,
    diagnostic: String,
}

/// Header row is written up front so empty reports still carry it
fn csv_writer(header: &[&str]) -> Result<csv::Writer<Vec<u8>>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(header)?;
    Ok(writer)
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sts_hints_core::{normalize, HintList, Mode, Policy, PolicyResolution, StaticResolver};
    use sts_hints_workflow::{Curator, Verifier};

    fn valid(mode: Mode, max_age: u64) -> PolicyResolution {
        PolicyResolution::Valid(Policy {
            id: "1".into(),
            mode,
            max_age,
            mx: vec!["mx.example".into()],
        })
    }

    async fn curation() -> CurationReport {
        colored::control::set_override(false);
        let resolver = StaticResolver::new()
            .with("good.example", valid(Mode::Enforce, 604_800))
            .with("testing.example", valid(Mode::Testing, 604_800));
        let candidates: Vec<String> = ["good.example", "testing.example", "Bad.example"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        Curator::new(resolver).run(&candidates, HintList::new()).await
    }

    #[tokio::test]
    async fn pretty_curation_lists_every_candidate() {
        let out = render_curation(&curation().await, OutputFormat::Pretty).unwrap();
        assert!(out.starts_with("Results:\n"));
        assert!(out.contains("\tgood.example\tincluding\n"));
        assert!(out.contains("\ttesting.example\tmode:testing\n"));
        assert!(out.contains("\tBad.example\tplease normalize as bad.example\n"));
        assert!(out.contains("1 included, 2 looked up, 3 candidates"));
    }

    #[tokio::test]
    async fn csv_curation_has_header_and_rows() {
        let out = render_curation(&curation().await, OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "domain,outcome,detail");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("good.example,including,"));
    }

    #[tokio::test]
    async fn json_curation_is_parseable() {
        let out = render_curation(&curation().await, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["records"][0]["outcome"], "included");
    }

    #[tokio::test]
    async fn pretty_verification_prints_diagnostics() {
        colored::control::set_override(false);
        let baseline: HintList = [normalize("example.com").unwrap(), normalize("example.net").unwrap()]
            .into_iter()
            .collect();
        let proposed: HintList = [normalize("example.com").unwrap()].into_iter().collect();
        let resolver = StaticResolver::new().with("example.net", PolicyResolution::NotFound);

        let report = Verifier::new(resolver).verify(&baseline, &proposed).await.unwrap();
        let out = render_verification(&report, OutputFormat::Pretty).unwrap();
        assert_eq!(
            out,
            "  Domain: example.net\n  No valid policy found\nChange accepted (0 added, 1 removed)\n"
        );
    }

    #[test]
    fn mixed_change_error_message() {
        colored::control::set_override(false);
        let err = HintsError::MixedChange { added: 2, removed: 1 };
        let out = render_verification_error(&err, OutputFormat::Pretty).unwrap();
        assert!(out.starts_with("  Please do not add and remove entries in the same PR"));
    }

    #[tokio::test]
    async fn csv_quotes_fields_with_commas() {
        let resolver = StaticResolver::new().with(
            "odd.example",
            PolicyResolution::Invalid {
                reason: "mx, missing".into(),
            },
        );
        let report = Curator::new(resolver)
            .run(&["odd.example".to_string()], HintList::new())
            .await;

        let out = render_curation(&report, OutputFormat::Csv).unwrap();
        assert_eq!(
            out,
            "domain,outcome,detail\nodd.example,no valid policy found,\"invalid policy: mx, missing\"\n"
        );
    }

    #[test]
    fn csv_error_is_a_single_column() {
        let err = HintsError::MixedChange { added: 1, removed: 1 };
        let out = render_verification_error(&err, OutputFormat::Csv).unwrap();
        assert_eq!(
            out,
            "error\nPlease do not add and remove entries in the same PR (1 added, 1 removed)\n"
        );
    }
}
