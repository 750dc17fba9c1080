//! Live MTA-STS policy resolution.
//!
//! [`StsResolver`] implements [`sts_hints_core::PolicyResolver`] by querying
//! the `_mta-sts` TXT record with `hickory-resolver` and downloading
//! `https://mta-sts.<domain>/.well-known/mta-sts.txt` with `reqwest`.
//! All failures are folded into [`sts_hints_core::PolicyResolution`].

mod config;
mod error;
pub mod parse;
mod resolver;

pub use config::*;
pub use error::{ResolverError, ResolverResult};
pub use resolver::{StsResolver, StsResolverBuilder};
pub use sts_hints_core::{PolicyResolution, PolicyResolver};
