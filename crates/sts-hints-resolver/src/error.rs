use sts_hints_core::PolicyResolution;
use thiserror::Error;

/// Result type alias for resolver internals
pub type ResolverResult<T> = std::result::Result<T, ResolverError>;

/// Failures encountered while looking up a policy
#[derive(Error, Debug)]
pub enum ResolverError {
    /// DNS query failed for a reason other than a missing record
    #[error("DNS error: {0}")]
    Dns(String),

    /// The `_mta-sts` TXT record could not be parsed
    #[error("invalid MTA-STS record: {0}")]
    InvalidRecord(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Request timed out
    #[error("request timed out")]
    Timeout,

    /// The policy host returned 404
    #[error("policy file not found")]
    PolicyNotFound,

    /// The policy host returned another non-success status
    #[error("policy host returned HTTP {0}")]
    PolicyStatus(u16),

    /// The policy file was malformed
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    /// The resolver could not be constructed
    #[error("configuration error: {0}")]
    Config(String),
}

impl ResolverError {
    /// Returns true if a later attempt might succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Dns(_) | Self::Http(_) | Self::Timeout | Self::PolicyStatus(_)
        )
    }
}

impl From<reqwest::Error> for ResolverError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<ResolverError> for PolicyResolution {
    fn from(err: ResolverError) -> Self {
        match err {
            ResolverError::PolicyNotFound => Self::NotFound,
            ResolverError::InvalidRecord(_) | ResolverError::InvalidPolicy(_) => Self::Invalid {
                reason: err.to_string(),
            },
            ResolverError::Dns(_)
            | ResolverError::Http(_)
            | ResolverError::Timeout
            | ResolverError::PolicyStatus(_)
            | ResolverError::Config(_) => Self::FetchError {
                reason: err.to_string(),
            },
        }
    }
}
