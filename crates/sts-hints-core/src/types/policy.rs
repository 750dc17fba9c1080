use std::fmt;

use serde::{Deserialize, Serialize};

/// Policy enforcement level declared by the `mode` field.
///
/// Unrecognised values are kept verbatim in [`Mode::Other`] so the policy
/// still parses and is rejected by the eligibility rules under its own name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    /// Sending MTAs must not deliver without a validated TLS connection
    Enforce,
    /// Failures are reported but delivery proceeds
    Testing,
    /// The domain has opted out of MTA-STS
    None,
    /// Any other value
    Other(String),
}

impl Mode {
    /// The mode as written in a policy file
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Enforce => "enforce",
            Self::Testing => "testing",
            Self::None => "none",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Mode {
    fn from(s: &str) -> Self {
        match s {
            "enforce" => Self::Enforce,
            "testing" => Self::Testing,
            "none" => Self::None,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Mode {
    fn from(s: String) -> Self {
        match Self::from(s.as_str()) {
            Self::Other(_) => Self::Other(s),
            known => known,
        }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// A parsed MTA-STS policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Policy id from the `_mta-sts` TXT record
    pub id: String,

    /// Enforcement level
    pub mode: Mode,

    /// Lifetime in seconds a sender should cache the policy
    pub max_age: u64,

    /// Permitted MX host patterns
    #[serde(default)]
    pub mx: Vec<String>,
}

impl Policy {
    /// Returns true if the policy mode is `enforce`
    #[must_use]
    pub fn is_enforcing(&self) -> bool {
        self.mode == Mode::Enforce
    }
}

/// Outcome of fetching the current policy of a domain.
///
/// Only [`PolicyResolution::Valid`] carries policy fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PolicyResolution {
    /// A well-formed policy was fetched
    Valid(Policy),
    /// The policy host answered that no policy file exists
    NotFound,
    /// The TXT record or the policy file was malformed
    Invalid {
        /// What was wrong with it
        reason: String,
    },
    /// Transient DNS or network failure
    FetchError {
        /// Underlying failure
        reason: String,
    },
    /// No `_mta-sts` TXT record is published
    NoneConfigured,
}

impl PolicyResolution {
    /// The policy, if one was fetched
    #[must_use]
    pub const fn policy(&self) -> Option<&Policy> {
        match self {
            Self::Valid(policy) => Some(policy),
            _ => None,
        }
    }

    /// Returns true for transient failures that a later run may not hit
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::FetchError { .. })
    }

    /// Short status label used in reports
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Valid(_) => "valid",
            Self::NotFound => "not_found",
            Self::Invalid { .. } => "invalid",
            Self::FetchError { .. } => "fetch_error",
            Self::NoneConfigured => "none",
        }
    }
}

impl fmt::Display for PolicyResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(policy) => write!(f, "mode={} max_age={}", policy.mode, policy.max_age),
            Self::NotFound => f.write_str("policy file not found"),
            Self::Invalid { reason } => write!(f, "invalid policy: {reason}"),
            Self::FetchError { reason } => write!(f, "fetch error: {reason}"),
            Self::NoneConfigured => f.write_str("no MTA-STS record"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips_through_str() {
        for mode in [Mode::Enforce, Mode::Testing, Mode::None] {
            assert_eq!(Mode::from(mode.as_str()), mode);
        }
        assert_eq!(Mode::from("Enforce"), Mode::Other("Enforce".into()));
    }

    #[test]
    fn unknown_mode_keeps_its_spelling() {
        let mode = Mode::from("strict".to_string());
        assert_eq!(mode.to_string(), "strict");
        assert_eq!(serde_json::to_value(&mode).unwrap(), "strict");
        let back: Mode = serde_json::from_value(serde_json::json!("testing")).unwrap();
        assert_eq!(back, Mode::Testing);
    }

    #[test]
    fn only_valid_carries_policy() {
        let valid = PolicyResolution::Valid(Policy {
            id: "1".into(),
            mode: Mode::Enforce,
            max_age: 604_800,
            mx: vec!["mx.example.com".into()],
        });
        assert!(valid.policy().is_some());
        assert!(PolicyResolution::NotFound.policy().is_none());
        assert!(PolicyResolution::FetchError { reason: "timeout".into() }.is_transient());
    }

    #[test]
    fn serializes_with_status_tag() {
        let json = serde_json::to_value(PolicyResolution::NoneConfigured).unwrap();
        assert_eq!(json["status"], "none_configured");
    }
}
