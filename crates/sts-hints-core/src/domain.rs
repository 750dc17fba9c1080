//! Domain name normalization.
//!
//! Hint list entries are stored in canonical DNS form: lowercase,
//! IDNA (punycode) encoded, without the trailing root dot. The same
//! canonical form is used for every membership comparison.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Host;

use crate::error::{HintsError, Result};

/// Maximum length of a single label in octets
const MAX_LABEL_LEN: usize = 63;

/// Maximum length of a full name in octets (without the root dot)
const MAX_NAME_LEN: usize = 253;

/// A domain name in canonical form.
///
/// Can only be obtained through [`normalize`] or [`ensure_normalized`], so
/// holding one means the value is already canonical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainName(String);

impl DomainName {
    /// The canonical name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the name and return the inner string
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for DomainName {
    type Err = HintsError;

    fn from_str(s: &str) -> Result<Self> {
        normalize(s)
    }
}

/// Convert a raw domain string to canonical form.
///
/// Surrounding whitespace and a single trailing root dot are removed, then
/// the name is case-folded and IDNA encoded.
///
/// # Errors
///
/// Returns [`HintsError::InvalidDomain`] when the input is empty, is an IP
/// literal, or is not a syntactically valid DNS name.
pub fn normalize(raw: &str) -> Result<DomainName> {
    let trimmed = raw.trim();
    let without_root = trimmed.strip_suffix('.').unwrap_or(trimmed);

    let invalid = |reason: &str| HintsError::InvalidDomain {
        input: raw.to_string(),
        reason: reason.to_string(),
    };

    if without_root.is_empty() {
        return Err(invalid("empty name"));
    }

    // Host::parse percent-decodes, so URL syntax must not reach it
    if without_root
        .bytes()
        .any(|b| b.is_ascii() && !(b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_')))
    {
        return Err(invalid("name contains characters not allowed in a host name"));
    }

    let ascii = match Host::parse(without_root) {
        Ok(Host::Domain(domain)) => domain,
        Ok(Host::Ipv4(_) | Host::Ipv6(_)) => return Err(invalid("IP address literal")),
        Err(e) => return Err(invalid(&e.to_string())),
    };

    if ascii.len() > MAX_NAME_LEN {
        return Err(invalid("name longer than 253 octets"));
    }

    for label in ascii.split('.') {
        if label.is_empty() {
            return Err(invalid("empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(invalid("label longer than 63 octets"));
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(invalid("label contains characters not allowed in a host name"));
        }
    }

    Ok(DomainName(ascii))
}

/// Accept `raw` only if it is already canonical.
///
/// Used wherever user input must be corrected by the user rather than
/// silently rewritten.
///
/// # Errors
///
/// Returns [`HintsError::InvalidDomain`] for unparsable input and
/// [`HintsError::NotNormalized`] when the canonical form differs from `raw`.
pub fn ensure_normalized(raw: &str) -> Result<DomainName> {
    let normalized = normalize(raw)?;
    if normalized.as_str() == raw {
        Ok(normalized)
    } else {
        Err(HintsError::NotNormalized {
            input: raw.to_string(),
            normalized: normalized.into_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_root() {
        assert_eq!(normalize("EXAMPLE.com").unwrap().as_str(), "example.com");
        assert_eq!(normalize("example.com.").unwrap().as_str(), "example.com");
        assert_eq!(normalize("  mail.Example.ORG \n").unwrap().as_str(), "mail.example.org");
    }

    #[test]
    fn encodes_unicode_as_punycode() {
        assert_eq!(normalize("點看.com").unwrap().as_str(), "xn--c1yn36f.com");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["EXAMPLE.com", "點看.com", "example.co.uk.", "Sub.Domain.Example.NET"] {
            let once = normalize(raw).unwrap();
            let twice = normalize(once.as_str()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn rejects_invalid_names() {
        for raw in [
            "",
            ".",
            "example..com",
            "exa mple.com",
            "1.2.3.4",
            "[::1]",
            "a/b.com",
            "ex%41mple.com",
            "user@example.com",
            "example.com:25",
        ] {
            assert!(
                matches!(normalize(raw), Err(HintsError::InvalidDomain { .. })),
                "{raw:?} should be rejected"
            );
        }

        let long_label = format!("{}.com", "a".repeat(64));
        assert!(normalize(&long_label).is_err());
    }

    #[test]
    fn ensure_normalized_reports_correction() {
        assert!(ensure_normalized("example.com").is_ok());

        match ensure_normalized("EXAMPLE.com") {
            Err(HintsError::NotNormalized { input, normalized }) => {
                assert_eq!(input, "EXAMPLE.com");
                assert_eq!(normalized, "example.com");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        match ensure_normalized("點看.com") {
            Err(e) => assert_eq!(e.to_string(), "Please normalize 點看.com as xn--c1yn36f.com"),
            Ok(_) => panic!("unicode input must be rejected"),
        }
    }

    #[test]
    fn parses_via_from_str() {
        let name: DomainName = "Example.Com".parse().unwrap();
        assert_eq!(name.to_string(), "example.com");
    }
}
