//! The policy lookup seam.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::DomainName;
use crate::types::PolicyResolution;

/// Fetches the current MTA-STS policy of a domain.
///
/// Implementations never fail: DNS and HTTP problems are reported as
/// [`PolicyResolution`] variants. Orchestrators call `resolve` at most once
/// per domain per pass and never retry.
#[async_trait]
pub trait PolicyResolver: Send + Sync {
    /// Resolve the policy currently published for `domain`
    async fn resolve(&self, domain: &DomainName) -> PolicyResolution;
}

#[async_trait]
impl<R: PolicyResolver + ?Sized> PolicyResolver for std::sync::Arc<R> {
    async fn resolve(&self, domain: &DomainName) -> PolicyResolution {
        (**self).resolve(domain).await
    }
}

/// Resolver answering from a fixed table, recording every lookup.
///
/// Domains missing from the table resolve to
/// [`PolicyResolution::NoneConfigured`].
#[derive(Debug, Default)]
pub struct StaticResolver {
    answers: HashMap<String, PolicyResolution>,
    calls: Mutex<Vec<String>>,
}

impl StaticResolver {
    /// An empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an answer for `domain`
    #[must_use]
    pub fn with(mut self, domain: &str, resolution: PolicyResolution) -> Self {
        self.answers.insert(domain.to_string(), resolution);
        self
    }

    /// Domains looked up so far, in call order
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PolicyResolver for StaticResolver {
    async fn resolve(&self, domain: &DomainName) -> PolicyResolution {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(domain.to_string());
        }
        self.answers
            .get(domain.as_str())
            .cloned()
            .unwrap_or(PolicyResolution::NoneConfigured)
    }
}
