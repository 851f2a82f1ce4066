//! Email value object
//!
//! Normalized, validated email addresses. Normalization (trim + lowercase)
//! happens before validation so equality and uniqueness checks are
//! case-insensitive.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::DomainError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// A validated, lowercase email address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parse and normalize an email address.
    ///
    /// The input is trimmed and lowercased before matching `local@domain.tld`.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let normalized = value.trim().to_lowercase();
        if !EMAIL_RE.is_match(&normalized) {
            return Err(DomainError::InvalidEmail(value.trim().to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after the `@`.
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map(|(_, d)| d).unwrap_or("")
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let email = Email::parse("alice@example.com").unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
        assert_eq!(email.domain(), "example.com");
    }

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let email = Email::parse("  Alice@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        for input in ["", "alice", "alice@", "@example.com", "alice@example", "a b@example.com"] {
            let result = Email::parse(input);
            assert!(
                matches!(result, Err(DomainError::InvalidEmail(_))),
                "expected {input:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_serde_transparent() {
        let email = Email::parse("bob@example.org").unwrap();
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, r#""bob@example.org""#);

        let back: Email = serde_json::from_str(&json).unwrap();
        assert_eq!(back, email);
    }
}
