//! Validated domain names

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully qualified, validated, lower-cased domain name
///
/// Validation follows RFC 1035 limits: at most 253 characters, at least two
/// labels, each label 1..=63 alphanumeric or hyphen characters that neither
/// start nor end with a hyphen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    /// Parse and normalize a domain name
    ///
    /// Surrounding whitespace and a single trailing dot are removed, and the
    /// name is lower-cased before validation.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
        let domain = trimmed.to_ascii_lowercase();

        if domain.is_empty() {
            return Err(Error::invalid_input("Domain name cannot be empty"));
        }

        if domain.len() > 253 {
            return Err(Error::invalid_input(format!(
                "Domain name too long: {} chars (max 253). Got: {}",
                domain.len(),
                domain
            )));
        }

        let mut labels = 0;
        for label in domain.split('.') {
            labels += 1;

            if label.is_empty() {
                return Err(Error::invalid_input(format!(
                    "Domain name has empty label: '{}'",
                    domain
                )));
            }

            if label.len() > 63 {
                return Err(Error::invalid_input(format!(
                    "Domain label too long: {} chars (max 63). Label: '{}'",
                    label.len(),
                    label
                )));
            }

            if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(Error::invalid_input(format!(
                    "Domain label contains invalid characters. Label: '{}'. \
                    Valid: alphanumeric and hyphen only.",
                    label
                )));
            }

            if label.starts_with('-') || label.ends_with('-') {
                return Err(Error::invalid_input(format!(
                    "Domain label cannot start or end with hyphen. Label: '{}'",
                    label
                )));
            }
        }

        if labels < 2 {
            return Err(Error::invalid_input(format!(
                "Domain name must have at least two labels. Got: '{}'",
                domain
            )));
        }

        Ok(Self(domain))
    }

    /// The normalized name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Second-level label, everything before the first dot
    ///
    /// `example.co.uk` yields `example`.
    pub fn sld(&self) -> &str {
        self.split().0
    }

    /// Everything after the first dot
    ///
    /// `example.co.uk` yields `co.uk`.
    pub fn tld(&self) -> &str {
        self.split().1
    }

    /// Hostname `<label>.<domain>`
    pub fn subdomain(&self, label: &str) -> String {
        format!("{}.{}", label, self.0)
    }

    fn split(&self) -> (&str, &str) {
        // parse() guarantees at least two labels
        self.0.split_once('.').unwrap_or((self.0.as_str(), ""))
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DomainName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DomainName> for String {
    fn from(value: DomainName) -> Self {
        value.0
    }
}

impl std::str::FromStr for DomainName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_trailing_dot() {
        let domain = DomainName::parse("  Example.COM. ").unwrap();
        assert_eq!(domain.as_str(), "example.com");
    }

    #[test]
    fn test_sld_tld_split_at_first_dot() {
        let domain = DomainName::parse("example.co.uk").unwrap();
        assert_eq!(domain.sld(), "example");
        assert_eq!(domain.tld(), "co.uk");
        assert_eq!(domain.subdomain("app"), "app.example.co.uk");
    }

    #[test]
    fn test_rejects_invalid_names() {
        assert!(DomainName::parse("").is_err());
        assert!(DomainName::parse("localhost").is_err());
        assert!(DomainName::parse("bad..example.com").is_err());
        assert!(DomainName::parse("-bad.example.com").is_err());
        assert!(DomainName::parse("bad_label.com").is_err());
        assert!(DomainName::parse(&format!("{}.com", "a".repeat(64))).is_err());
        assert!(DomainName::parse(&format!("{}.com", "a.".repeat(130))).is_err());
    }

    #[test]
    fn test_serde_round_trips_through_validation() {
        let json = serde_json::to_string(&DomainName::parse("example.com").unwrap()).unwrap();
        assert_eq!(json, "\"example.com\"");

        let invalid: std::result::Result<DomainName, _> = serde_json::from_str("\"nodots\"");
        assert!(invalid.is_err());
    }
}
