//! Core types and invariants for MTA-STS hint lists.
//!
//! This crate holds everything that does not touch the network:
//!
//! - **Domains**: canonical [`DomainName`]s via [`normalize`]
//! - **Store**: the sorted, duplicate-free [`HintList`] and its file format
//! - **Eligibility**: the inclusion predicate in [`EligibilityRules`]
//! - **Diff**: [`DiffResult`] between two list versions
//! - **Resolver seam**: the [`PolicyResolver`] trait live lookups implement
//! - **Errors**: [`HintsError`]
//!
//! # Example
//!
//! ```rust
//! use sts_hints_core::{normalize, HintList};
//!
//! let mut list = HintList::new();
//! list.insert(normalize("Example.COM").unwrap());
//! assert_eq!(list.to_file_contents(), "example.com\n");
//! ```

pub mod diff;
pub mod domain;
pub mod eligibility;
mod error;
pub mod hintlist;
pub mod resolver;
pub mod types;

pub use diff::{diff, diff_files, DiffResult};
pub use domain::{ensure_normalized, normalize, DomainName};
pub use eligibility::{
    is_eligible, Eligibility, EligibilityRules, Ineligibility, ONE_WEEK_IN_SECONDS,
};
pub use error::{HintsError, Result};
pub use hintlist::HintList;
pub use resolver::{PolicyResolver, StaticResolver};
pub use types::*;
