use std::path::PathBuf;

use thiserror::Error;

use crate::eligibility::Ineligibility;

/// Result type alias for hint list operations
pub type Result<T> = std::result::Result<T, HintsError>;

/// Errors that can occur while curating or verifying a hint list
#[derive(Error, Debug)]
pub enum HintsError {
    /// Input is not a syntactically valid domain name
    #[error("invalid domain name {input:?}: {reason}")]
    InvalidDomain {
        /// The raw input that failed to parse
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// Input is a valid domain but not in canonical form
    #[error("Please normalize {input} as {normalized}")]
    NotNormalized {
        /// The raw input as supplied
        input: String,
        /// The canonical form it should have been written as
        normalized: String,
    },

    /// A persisted list is not sorted ascending
    #[error("{}: domain list must be sorted ({entry:?} on line {line} is out of order)", path.display())]
    UnsortedList {
        /// File the list was read from
        path: PathBuf,
        /// 1-indexed line number of the first out-of-order entry
        line: usize,
        /// The out-of-order entry
        entry: String,
    },

    /// A persisted list contains the same entry twice
    #[error("{}: domain list must not have duplicates ({entry:?} on line {line})", path.display())]
    DuplicateEntry {
        /// File the list was read from
        path: PathBuf,
        /// 1-indexed line number of the repeated entry
        line: usize,
        /// The repeated entry
        entry: String,
    },

    /// A proposed change both adds and removes entries
    #[error("Please do not add and remove entries in the same PR ({added} added, {removed} removed)")]
    MixedChange {
        /// Number of added entries
        added: usize,
        /// Number of removed entries
        removed: usize,
    },

    /// An added domain does not currently meet the inclusion criteria
    #[error("{domain} cannot be added: {reason}")]
    IneligibleAddition {
        /// The added entry
        domain: String,
        /// The first rule it failed
        reason: Ineligibility,
    },

    /// A removed domain still meets the inclusion criteria
    #[error("{domain} still meets the inclusion criteria and cannot be removed")]
    StillEligibleRemoval {
        /// The removed entry
        domain: String,
    },

    /// Policy fetch failed transiently
    #[error("policy fetch failed for {domain}: {message}")]
    Fetch {
        /// Domain being resolved
        domain: String,
        /// Underlying failure
        message: String,
    },

    /// Writing the list back to disk failed
    #[error("failed to persist {}: {message}", path.display())]
    Persist {
        /// Target file
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HintsError {
    /// Returns true if the error means the inputs of the whole run cannot be trusted
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsortedList { .. }
                | Self::DuplicateEntry { .. }
                | Self::MixedChange { .. }
                | Self::Persist { .. }
                | Self::Io(_)
        )
    }

    /// Returns true if the error concerns a single domain rather than the run
    #[must_use]
    pub const fn is_domain_finding(&self) -> bool {
        matches!(
            self,
            Self::InvalidDomain { .. }
                | Self::NotNormalized { .. }
                | Self::IneligibleAddition { .. }
                | Self::StillEligibleRemoval { .. }
                | Self::Fetch { .. }
        )
    }
}
