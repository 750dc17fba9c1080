//! Change verification between a baseline list and a proposed list.
//!
//! A change may only add or only remove entries. Every addition must qualify
//! right now, and every removal must no longer qualify. Per-domain problems
//! are collected for the whole change before the verdict is reached.

use std::path::Path;

use futures_util::stream::{self, StreamExt};
use serde::{Serialize, Serializer};
use sts_hints_core::{
    ensure_normalized, DiffResult, DomainName, Eligibility, EligibilityRules, HintList,
    HintsError, PolicyResolution, PolicyResolver, Result,
};
use tracing::{debug, info};

use crate::config::PassConfig;

/// Which side of the diff an entry is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Present only in the proposed list
    Added,
    /// Present only in the baseline list
    Removed,
}

/// Verification result for one changed entry
#[derive(Debug, Serialize)]
pub struct DomainCheck {
    /// The entry as written in the list
    pub domain: String,

    /// Side of the diff
    pub direction: Direction,

    /// Lookup result, when the entry could be looked up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<PolicyResolution>,

    /// Predicate verdict, when the entry could be looked up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<Eligibility>,

    /// Operator-facing diagnostic lines
    pub diagnostics: Vec<String>,

    /// The rule this entry violates, if any
    #[serde(serialize_with = "serialize_violation")]
    pub violation: Option<HintsError>,
}

impl DomainCheck {
    /// Returns true if this entry does not block the change
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.violation.is_none()
    }
}

/// Result of verifying a change
#[derive(Debug, Serialize)]
pub struct VerificationReport {
    /// Entries added and removed
    pub diff: DiffResult,

    /// One check per changed entry, additions first, each side sorted
    pub checks: Vec<DomainCheck>,
}

impl VerificationReport {
    /// Returns true if the change may be accepted
    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks.iter().all(DomainCheck::passed)
    }

    /// Every violation found
    pub fn violations(&self) -> impl Iterator<Item = &HintsError> {
        self.checks.iter().filter_map(|c| c.violation.as_ref())
    }

    /// Process exit status: 0 when the change is accepted, 1 otherwise
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(!self.passed())
    }
}

enum Pending {
    Done(DomainCheck),
    Lookup {
        raw: String,
        direction: Direction,
        domain: DomainName,
    },
}

/// Drives change verification
pub struct Verifier<R> {
    resolver: R,
    config: PassConfig,
}

impl<R: PolicyResolver> Verifier<R> {
    /// Create a verifier with default settings
    pub fn new(resolver: R) -> Self {
        Self::with_config(resolver, PassConfig::default())
    }

    /// Create a verifier with custom settings
    pub const fn with_config(resolver: R, config: PassConfig) -> Self {
        Self { resolver, config }
    }

    /// The resolver in use
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Strictly load both files and verify the change between them.
    ///
    /// # Errors
    ///
    /// Fails without looking anything up if either file is unsorted or holds
    /// duplicates, or if the change both adds and removes entries.
    pub async fn verify_files(&self, baseline: &Path, proposed: &Path) -> Result<VerificationReport> {
        let baseline = HintList::load_strict(baseline)?;
        let proposed = HintList::load_strict(proposed)?;
        self.verify(&baseline, &proposed).await
    }

    /// Verify the change from `baseline` to `proposed`.
    ///
    /// # Errors
    ///
    /// Returns [`HintsError::MixedChange`] if the change both adds and removes
    /// entries. Per-domain problems are reported in the returned report.
    pub async fn verify(&self, baseline: &HintList, proposed: &HintList) -> Result<VerificationReport> {
        let diff = baseline.diff(proposed);

        if diff.is_mixed() {
            return Err(HintsError::MixedChange {
                added: diff.added.len(),
                removed: diff.removed.len(),
            });
        }

        if diff.is_empty() {
            debug!("no entries changed");
            return Ok(VerificationReport {
                diff,
                checks: Vec::new(),
            });
        }

        let pending: Vec<Pending> = diff
            .added
            .iter()
            .map(|raw| prepare(raw, Direction::Added))
            .chain(diff.removed.iter().map(|raw| prepare(raw, Direction::Removed)))
            .collect();

        let resolver = &self.resolver;
        let rules = self.config.rules;
        let checks: Vec<DomainCheck> = stream::iter(pending)
            .map(|item| async move {
                match item {
                    Pending::Done(check) => check,
                    Pending::Lookup {
                        raw,
                        direction,
                        domain,
                    } => {
                        debug!(domain = %domain, ?direction, "resolving changed entry");
                        let resolution = resolver.resolve(&domain).await;
                        judge(raw, direction, resolution, &rules)
                    }
                }
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let report = VerificationReport { diff, checks };
        info!(
            added = report.diff.added.len(),
            removed = report.diff.removed.len(),
            violations = report.violations().count(),
            "verification complete"
        );
        Ok(report)
    }
}

/// Settle entries that cannot be looked up because they are not canonical
fn prepare(raw: &str, direction: Direction) -> Pending {
    let mut diagnostics = vec![format!("Domain: {raw}")];
    match ensure_normalized(raw) {
        Ok(domain) => Pending::Lookup {
            raw: raw.to_string(),
            direction,
            domain,
        },
        Err(e) => {
            diagnostics.push(e.to_string());
            // A name that cannot be looked up cannot still qualify, so
            // removing it is allowed.
            let violation = match direction {
                Direction::Added => Some(e),
                Direction::Removed => None,
            };
            Pending::Done(DomainCheck {
                domain: raw.to_string(),
                direction,
                resolution: None,
                eligibility: None,
                diagnostics,
                violation,
            })
        }
    }
}

/// Apply the predicate to a looked-up entry
fn judge(
    raw: String,
    direction: Direction,
    resolution: PolicyResolution,
    rules: &EligibilityRules,
) -> DomainCheck {
    let eligibility = rules.evaluate(&resolution);
    let mut diagnostics = vec![format!("Domain: {raw}")];

    if let Some(reason) = eligibility.reason() {
        diagnostics.push(reason.explain(rules));
        if resolution.is_transient() {
            diagnostics.push(resolution.to_string());
        }
    }

    let violation = match (direction, &eligibility) {
        (Direction::Added, Eligibility::Ineligible(reason)) => Some(HintsError::IneligibleAddition {
            domain: raw.clone(),
            reason: reason.clone(),
        }),
        (Direction::Removed, Eligibility::Eligible) => {
            diagnostics.push("Still meets the inclusion criteria, removal rejected".to_string());
            Some(HintsError::StillEligibleRemoval { domain: raw.clone() })
        }
        _ => None,
    };

    DomainCheck {
        domain: raw,
        direction,
        resolution: Some(resolution),
        eligibility: Some(eligibility),
        diagnostics,
        violation,
    }
}

#[allow(clippy::ref_option)]
fn serialize_violation<S: Serializer>(
    violation: &Option<HintsError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match violation {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sts_hints_core::{normalize, Mode, Policy, StaticResolver};

    fn valid(mode: Mode, max_age: u64) -> PolicyResolution {
        PolicyResolution::Valid(Policy {
            id: "1".into(),
            mode,
            max_age,
            mx: vec!["mx.example".into()],
        })
    }

    fn list(entries: &[&str]) -> HintList {
        entries.iter().map(|e| normalize(e).unwrap()).collect()
    }

    fn baseline() -> HintList {
        list(&["example.com", "example.net"])
    }

    #[tokio::test]
    async fn unchanged_list_passes() {
        let verifier = Verifier::new(StaticResolver::new());
        let report = verifier.verify(&baseline(), &baseline()).await.unwrap();
        assert!(report.passed());
        assert_eq!(report.exit_code(), 0);
        assert!(verifier.resolver().calls().is_empty());
    }

    #[tokio::test]
    async fn mixed_change_is_rejected_before_lookup() {
        let verifier = Verifier::new(StaticResolver::new());
        let proposed = list(&["example.co.uk", "example.com", "example.gov"]);

        let err = verifier.verify(&baseline(), &proposed).await.unwrap_err();
        assert!(matches!(err, HintsError::MixedChange { added: 2, removed: 1 }));
        assert!(verifier.resolver().calls().is_empty());
    }

    #[tokio::test]
    async fn eligible_addition_passes() {
        let resolver = StaticResolver::new().with("microsoft.com", valid(Mode::Enforce, 1_209_600));
        let verifier = Verifier::new(resolver);
        let proposed = list(&["example.com", "example.net", "microsoft.com"]);

        let report = verifier.verify(&baseline(), &proposed).await.unwrap();
        assert!(report.passed());
        assert_eq!(report.checks.len(), 1);
        assert_eq!(report.checks[0].diagnostics, ["Domain: microsoft.com"]);
    }

    #[tokio::test]
    async fn removal_of_unqualified_domain_passes() {
        let resolver = StaticResolver::new().with("example.net", PolicyResolution::NotFound);
        let verifier = Verifier::new(resolver);

        let report = verifier
            .verify(&baseline(), &list(&["example.com"]))
            .await
            .unwrap();
        assert!(report.passed());
        assert_eq!(
            report.checks[0].diagnostics,
            ["Domain: example.net", "No valid policy found"]
        );
    }

    #[tokio::test]
    async fn removal_of_qualified_domain_fails() {
        let resolver = StaticResolver::new().with("example.net", valid(Mode::Enforce, 604_800));
        let verifier = Verifier::new(resolver);

        let report = verifier
            .verify(&baseline(), &list(&["example.com"]))
            .await
            .unwrap();
        assert!(!report.passed());
        assert_eq!(report.exit_code(), 1);
        assert!(matches!(
            report.violations().next(),
            Some(HintsError::StillEligibleRemoval { .. })
        ));
    }

    #[tokio::test]
    async fn every_ineligible_addition_is_reported() {
        let resolver = StaticResolver::new()
            .with("good.example", valid(Mode::Enforce, 604_800))
            .with("testing.example", valid(Mode::Testing, 604_800))
            .with("short.example", valid(Mode::Enforce, 3_600));
        let verifier = Verifier::with_config(resolver, PassConfig::new().concurrency(1));
        let proposed = list(&[
            "example.com",
            "example.net",
            "good.example",
            "short.example",
            "testing.example",
        ]);

        let report = verifier.verify(&baseline(), &proposed).await.unwrap();
        assert!(!report.passed());
        assert_eq!(report.violations().count(), 2);
        assert_eq!(
            verifier.resolver().calls(),
            ["good.example", "short.example", "testing.example"]
        );

        let short = &report.checks[1];
        assert_eq!(short.domain, "short.example");
        assert_eq!(
            short.diagnostics[1],
            "max_age must be at least 604800 to be included"
        );
        let testing = &report.checks[2];
        assert_eq!(testing.diagnostics[1], "Policy not in enforce mode (testing)");
    }

    #[tokio::test]
    async fn non_normalized_addition_is_rejected_without_lookup() {
        let resolver = StaticResolver::new().with("example.org", valid(Mode::Enforce, 604_800));
        let verifier = Verifier::new(resolver);

        let mut proposed = baseline();
        let raw = "EXAMPLE.org";
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("proposed.txt");
        std::fs::write(&path, format!("{raw}\n{}", proposed.to_file_contents())).unwrap();
        proposed = HintList::load_strict(&path).unwrap();

        let report = verifier.verify(&baseline(), &proposed).await.unwrap();
        assert!(!report.passed());
        assert!(verifier.resolver().calls().is_empty());
        assert_eq!(
            report.checks[0].diagnostics,
            ["Domain: EXAMPLE.org", "Please normalize EXAMPLE.org as example.org"]
        );
    }

    #[tokio::test]
    async fn transient_failure_blocks_addition() {
        let resolver = StaticResolver::new()
            .with("flaky.example", PolicyResolution::FetchError { reason: "timeout".into() });
        let verifier = Verifier::new(resolver);
        let proposed = list(&["example.com", "example.net", "flaky.example"]);

        let report = verifier.verify(&baseline(), &proposed).await.unwrap();
        assert!(!report.passed());
        assert_eq!(report.checks[0].diagnostics.last().unwrap(), "fetch error: timeout");
    }

    #[tokio::test]
    async fn verify_files_rejects_unsorted_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let good = dir.path().join("good.txt");
        let bad = dir.path().join("bad.txt");
        std::fs::write(&good, "example.com\nexample.net\n").unwrap();
        std::fs::write(&bad, "example.net\nexample.com\n").unwrap();

        let verifier = Verifier::new(StaticResolver::new());
        assert!(matches!(
            verifier.verify_files(&good, &bad).await,
            Err(HintsError::UnsortedList { .. })
        ));
        assert!(verifier.verify_files(&good, &good).await.unwrap().passed());
    }

    #[tokio::test]
    async fn report_serializes_violation_as_message() {
        let resolver = StaticResolver::new().with("example.net", valid(Mode::Enforce, 604_800));
        let verifier = Verifier::new(resolver);
        let report = verifier
            .verify(&baseline(), &list(&["example.com"]))
            .await
            .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["checks"][0]["direction"], "removed");
        assert_eq!(
            json["checks"][0]["violation"],
            "example.net still meets the inclusion criteria and cannot be removed"
        );
    }
}
