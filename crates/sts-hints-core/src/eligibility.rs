//! Inclusion criteria for the hint list.
//!
//! A domain qualifies when its current policy is valid, in `enforce` mode and
//! declares a `max_age` of at least the configured minimum. The predicate is
//! pure: evaluating the same resolution twice always yields the same verdict.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Mode, PolicyResolution};

/// One week in seconds
pub const ONE_WEEK_IN_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Why a resolution does not qualify
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum Ineligibility {
    /// No valid policy could be fetched
    NoValidPolicy,
    /// Policy is not in `enforce` mode
    Mode(Mode),
    /// Policy lifetime is below the minimum
    MaxAge(u64),
}

impl Ineligibility {
    /// Operator-facing explanation, phrased against the configured rules
    #[must_use]
    pub fn explain(&self, rules: &EligibilityRules) -> String {
        match self {
            Self::NoValidPolicy => "No valid policy found".to_string(),
            Self::Mode(mode) => format!("Policy not in enforce mode ({mode})"),
            Self::MaxAge(_) => format!(
                "max_age must be at least {} to be included",
                rules.min_max_age
            ),
        }
    }
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoValidPolicy => f.write_str("no valid policy found"),
            Self::Mode(mode) => write!(f, "mode:{mode}"),
            Self::MaxAge(max_age) => write!(f, "max_age:{max_age}"),
        }
    }
}

/// Verdict of the eligibility predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Eligibility {
    /// Qualifies for inclusion
    Eligible,
    /// Does not qualify, with the first rule that failed
    Ineligible(Ineligibility),
}

impl Eligibility {
    /// Returns true for [`Eligibility::Eligible`]
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }

    /// The failed rule, if any
    #[must_use]
    pub const fn reason(&self) -> Option<&Ineligibility> {
        match self {
            Self::Eligible => None,
            Self::Ineligible(reason) => Some(reason),
        }
    }
}

/// Tunable inclusion rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRules {
    /// Minimum accepted `max_age` in seconds
    pub min_max_age: u64,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            min_max_age: ONE_WEEK_IN_SECONDS,
        }
    }
}

impl EligibilityRules {
    /// Rules with a custom minimum policy lifetime
    #[must_use]
    pub const fn with_min_max_age(min_max_age: u64) -> Self {
        Self { min_max_age }
    }

    /// Evaluate a resolution. The first failing rule wins.
    #[must_use]
    pub fn evaluate(&self, resolution: &PolicyResolution) -> Eligibility {
        let Some(policy) = resolution.policy() else {
            return Eligibility::Ineligible(Ineligibility::NoValidPolicy);
        };

        if policy.mode != Mode::Enforce {
            return Eligibility::Ineligible(Ineligibility::Mode(policy.mode.clone()));
        }

        if policy.max_age < self.min_max_age {
            return Eligibility::Ineligible(Ineligibility::MaxAge(policy.max_age));
        }

        Eligibility::Eligible
    }
}

/// Evaluate a resolution against the default rules
#[must_use]
pub fn is_eligible(resolution: &PolicyResolution) -> Eligibility {
    EligibilityRules::default().evaluate(resolution)
}
