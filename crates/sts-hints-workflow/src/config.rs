//! Settings shared by discovery and verification passes.

use sts_hints_core::EligibilityRules;

/// Default number of policy lookups in flight at once
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Settings for one orchestrator pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassConfig {
    /// Inclusion criteria
    pub rules: EligibilityRules,

    /// Maximum concurrent policy lookups (1 = strictly sequential)
    pub concurrency: usize,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            rules: EligibilityRules::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl PassConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inclusion rules
    #[must_use]
    pub const fn rules(mut self, rules: EligibilityRules) -> Self {
        self.rules = rules;
        self
    }

    /// Set the minimum accepted `max_age`
    #[must_use]
    pub const fn min_max_age(mut self, seconds: u64) -> Self {
        self.rules = EligibilityRules::with_min_max_age(seconds);
        self
    }

    /// Set the lookup concurrency. Zero is treated as one.
    #[must_use]
    pub const fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = if concurrency == 0 { 1 } else { concurrency };
        self
    }
}
