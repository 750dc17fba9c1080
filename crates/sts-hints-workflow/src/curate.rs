//! Bulk discovery: check candidate domains and add the ones that qualify.
//!
//! Discovery is exploratory. A candidate that resolves to a valid but
//! ineligible policy is an ordinary report entry, never an error.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use sts_hints_core::{
    ensure_normalized, DomainName, Eligibility, HintList, HintsError, Ineligibility,
    PolicyResolution, PolicyResolver, Result,
};
use tracing::{debug, info};

use crate::config::PassConfig;

/// What happened to one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CandidateOutcome {
    /// Qualified and was added to the list
    Included,
    /// Resolved but did not qualify
    Rejected {
        /// First failed rule
        reason: Ineligibility,
    },
    /// Already listed, not looked up
    AlreadyIncluded,
    /// Repeated earlier in the candidate list, not looked up again
    Duplicate,
    /// Valid name written in non-canonical form
    NotNormalized {
        /// Canonical form the candidate should be written as
        normalized: String,
    },
    /// Not a domain name
    InvalidDomain {
        /// Why it was rejected
        reason: String,
    },
}

impl CandidateOutcome {
    /// Returns true if the candidate was looked up
    #[must_use]
    pub const fn was_resolved(&self) -> bool {
        matches!(self, Self::Included | Self::Rejected { .. })
    }
}

impl fmt::Display for CandidateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Included => f.write_str("including"),
            Self::Rejected { reason } => write!(f, "{reason}"),
            Self::AlreadyIncluded => f.write_str("already included"),
            Self::Duplicate => f.write_str("duplicate candidate"),
            Self::NotNormalized { normalized } => write!(f, "please normalize as {normalized}"),
            Self::InvalidDomain { reason } => write!(f, "invalid domain: {reason}"),
        }
    }
}

/// Report line for one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRecord {
    /// Candidate as written in the input
    pub domain: String,

    /// What happened to it
    #[serde(flatten)]
    pub outcome: CandidateOutcome,

    /// Lookup result, for candidates that were looked up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<PolicyResolution>,
}

/// Result of a discovery pass
#[derive(Debug, Clone, Serialize)]
pub struct CurationReport {
    /// When the pass started
    pub started_at: DateTime<Utc>,

    /// One record per candidate, in input order
    pub records: Vec<CandidateRecord>,

    /// The list with every qualifying candidate inserted
    #[serde(skip)]
    pub list: HintList,
}

impl CurationReport {
    /// Candidates added in this pass
    pub fn included(&self) -> impl Iterator<Item = &CandidateRecord> {
        self.records
            .iter()
            .filter(|r| r.outcome == CandidateOutcome::Included)
    }

    /// Number of candidates added in this pass
    #[must_use]
    pub fn included_count(&self) -> usize {
        self.included().count()
    }

    /// Number of candidates that were looked up
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.was_resolved()).count()
    }

    /// Candidates whose lookup failed transiently
    pub fn transient_failures(&self) -> impl Iterator<Item = &CandidateRecord> {
        self.records.iter().filter(|r| {
            r.resolution
                .as_ref()
                .is_some_and(PolicyResolution::is_transient)
        })
    }
}

enum Slot {
    Done(CandidateRecord),
    Lookup { raw: String, domain: DomainName },
}

enum Resolved {
    Done(CandidateRecord),
    Fetched {
        raw: String,
        domain: DomainName,
        resolution: PolicyResolution,
    },
}

/// Drives a discovery pass
pub struct Curator<R> {
    resolver: R,
    config: PassConfig,
}

impl<R: PolicyResolver> Curator<R> {
    /// Create a curator with default settings
    pub fn new(resolver: R) -> Self {
        Self::with_config(resolver, PassConfig::default())
    }

    /// Create a curator with custom settings
    pub const fn with_config(resolver: R, config: PassConfig) -> Self {
        Self { resolver, config }
    }

    /// The resolver in use
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Run a pass over `candidates`, starting from `list`
    pub async fn run(&self, candidates: &[String], list: HintList) -> CurationReport {
        self.run_with(candidates, list, |_| {}).await
    }

    /// Run a pass, calling `on_record` as each candidate is settled.
    ///
    /// Lookups run concurrently up to the configured limit, but records are
    /// settled and inserted one at a time in input order.
    pub async fn run_with<F>(
        &self,
        candidates: &[String],
        mut list: HintList,
        mut on_record: F,
    ) -> CurationReport
    where
        F: FnMut(&CandidateRecord),
    {
        let started_at = Utc::now();
        let slots = plan(candidates, &list);
        let resolver = &self.resolver;
        let rules = self.config.rules;

        let mut resolved = stream::iter(slots)
            .map(|slot| async move {
                match slot {
                    Slot::Done(record) => Resolved::Done(record),
                    Slot::Lookup { raw, domain } => {
                        debug!(domain = %domain, "resolving candidate");
                        let resolution = resolver.resolve(&domain).await;
                        Resolved::Fetched {
                            raw,
                            domain,
                            resolution,
                        }
                    }
                }
            })
            .buffered(self.config.concurrency.max(1));

        let mut records = Vec::with_capacity(candidates.len());
        while let Some(item) = resolved.next().await {
            let record = match item {
                Resolved::Done(record) => record,
                Resolved::Fetched {
                    raw,
                    domain,
                    resolution,
                } => {
                    let outcome = match rules.evaluate(&resolution) {
                        Eligibility::Eligible => {
                            list.insert(domain);
                            CandidateOutcome::Included
                        }
                        Eligibility::Ineligible(reason) => CandidateOutcome::Rejected { reason },
                    };
                    CandidateRecord {
                        domain: raw,
                        outcome,
                        resolution: Some(resolution),
                    }
                }
            };
            on_record(&record);
            records.push(record);
        }

        let report = CurationReport {
            started_at,
            records,
            list,
        };
        info!(
            candidates = candidates.len(),
            resolved = report.resolved_count(),
            included = report.included_count(),
            "discovery pass complete"
        );
        report
    }

    /// Load the list at `hints`, run a pass and persist the result.
    ///
    /// The file is written once, after every candidate has been settled.
    /// Dropping the returned future before it completes leaves the file
    /// untouched.
    pub async fn run_file(&self, candidates: &[String], hints: &Path) -> Result<CurationReport> {
        self.run_file_with(candidates, hints, |_| {}).await
    }

    /// [`Curator::run_file`] with a per-record callback
    pub async fn run_file_with<F>(
        &self,
        candidates: &[String],
        hints: &Path,
        on_record: F,
    ) -> Result<CurationReport>
    where
        F: FnMut(&CandidateRecord),
    {
        let list = HintList::load(hints)?;
        let report = self.run_with(candidates, list, on_record).await;
        report.list.persist(hints)?;
        Ok(report)
    }
}

/// Settle everything that needs no lookup, in input order
fn plan(candidates: &[String], list: &HintList) -> Vec<Slot> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .map(|raw| {
            let done = |outcome| {
                Slot::Done(CandidateRecord {
                    domain: raw.clone(),
                    outcome,
                    resolution: None,
                })
            };
            match ensure_normalized(raw) {
                Err(HintsError::NotNormalized { normalized, .. }) => {
                    done(CandidateOutcome::NotNormalized { normalized })
                }
                Err(e) => done(CandidateOutcome::InvalidDomain {
                    reason: e.to_string(),
                }),
                Ok(domain) if list.contains(&domain) => done(CandidateOutcome::AlreadyIncluded),
                Ok(domain) if !seen.insert(domain.clone()) => done(CandidateOutcome::Duplicate),
                Ok(domain) => Slot::Lookup {
                    raw: raw.clone(),
                    domain,
                },
            }
        })
        .collect()
}

/// Read a candidate file: one domain per line, blank lines ignored
pub fn read_candidates(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
