//! Resolver configuration types.

use std::time::Duration;

/// Default timeout for the policy fetch
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Policy files larger than this are rejected
pub const DEFAULT_MAX_POLICY_SIZE: usize = 64 * 1024;

/// Well-known path of the policy file on the policy host
pub const POLICY_PATH: &str = "/.well-known/mta-sts.txt";

/// Settings for fetching policy files
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout
    pub timeout: Duration,

    /// User-Agent header sent to policy hosts
    pub user_agent: String,

    /// Maximum accepted body size in bytes
    pub max_policy_size: usize,

    /// Fetch from this base URL instead of `https://mta-sts.<domain>`
    pub policy_base_url: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("sts-hints/{}", env!("CARGO_PKG_VERSION")),
            max_policy_size: DEFAULT_MAX_POLICY_SIZE,
            policy_base_url: None,
        }
    }
}

impl FetchConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set the maximum accepted body size
    #[must_use]
    pub const fn max_policy_size(mut self, bytes: usize) -> Self {
        self.max_policy_size = bytes;
        self
    }

    /// Override the policy host (useful for testing)
    #[must_use]
    pub fn policy_base_url(mut self, url: impl Into<String>) -> Self {
        self.policy_base_url = Some(url.into());
        self
    }

    /// URL of the policy file for `domain`
    #[must_use]
    pub fn policy_url(&self, domain: &str) -> String {
        match &self.policy_base_url {
            Some(base) => format!("{}{POLICY_PATH}", base.trim_end_matches('/')),
            None => format!("https://mta-sts.{domain}{POLICY_PATH}"),
        }
    }
}
