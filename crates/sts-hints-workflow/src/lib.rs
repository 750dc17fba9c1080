//! Orchestrator passes over MTA-STS hint lists.
//!
//! - [`Curator`]: bulk discovery, appending qualifying candidates to a list
//! - [`Verifier`]: change verification between two list versions
//!
//! Both return immutable reports; rendering is left to the caller.

pub mod config;
pub mod curate;
pub mod verify;

pub use config::PassConfig;
pub use curate::{read_candidates, CandidateOutcome, CandidateRecord, CurationReport, Curator};
pub use verify::{DomainCheck, Direction, VerificationReport, Verifier};
