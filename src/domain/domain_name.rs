// Copyright (c) 2025 - Cowboy AI, Inc.
//! Domain Name and Image Reference Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Domain name validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainNameError {
    #[error("Domain name is empty")]
    Empty,

    #[error("Domain name exceeds maximum length of 253 characters: {0}")]
    TooLong(usize),

    #[error("Label exceeds maximum length of 63 characters: {0}")]
    LabelTooLong(String),

    #[error("Empty label in domain name: {0}")]
    EmptyLabel(String),

    #[error("Invalid character in domain name: {0}")]
    InvalidCharacter(char),

    #[error("Label cannot start or end with hyphen: {0}")]
    InvalidLabelFormat(String),

    #[error("Top-level label cannot be all numeric: {0}")]
    NumericTld(String),
}

/// Image reference validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageReferenceError {
    #[error("container image reference is required")]
    Empty,

    #[error("container image reference contains whitespace: {0:?}")]
    Whitespace(String),
}

/// Public DNS name the site is served under
///
/// Follows RFC 1123:
/// - Total length ≤ 253 characters
/// - Each label ≤ 63 characters, alphanumeric or hyphen
/// - Labels cannot start or end with hyphens
/// - The top-level label cannot be all numeric
///
/// Names are stored lowercase so that the same domain always yields the same
/// logical graph.
///
/// # Examples
///
/// ```rust
/// use portfolio_infrastructure::domain::DomainName;
///
/// let domain = DomainName::new("Example.com").unwrap();
/// assert_eq!(domain.as_str(), "example.com");
/// assert_eq!(domain.www(), "www.example.com");
///
/// assert!(DomainName::new("").is_err());
/// assert!(DomainName::new("-bad.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    /// Maximum total length (RFC 1123)
    pub const MAX_LENGTH: usize = 253;

    /// Maximum length of a single label (RFC 1123)
    pub const MAX_LABEL_LENGTH: usize = 63;

    /// Create a new domain name with validation
    pub fn new(name: impl AsRef<str>) -> Result<Self, DomainNameError> {
        let name = name.as_ref().trim().trim_end_matches('.').to_ascii_lowercase();

        if name.is_empty() {
            return Err(DomainNameError::Empty);
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(DomainNameError::TooLong(name.len()));
        }

        let labels: Vec<&str> = name.split('.').collect();
        for label in &labels {
            Self::validate_label(label, &name)?;
        }

        if let Some(tld) = labels.last() {
            if labels.len() > 1 && tld.chars().all(|c| c.is_ascii_digit()) {
                return Err(DomainNameError::NumericTld(tld.to_string()));
            }
        }

        Ok(Self(name))
    }

    fn validate_label(label: &str, name: &str) -> Result<(), DomainNameError> {
        if label.is_empty() {
            return Err(DomainNameError::EmptyLabel(name.to_string()));
        }

        if label.len() > Self::MAX_LABEL_LENGTH {
            return Err(DomainNameError::LabelTooLong(label.to_string()));
        }

        if let Some(ch) = label
            .chars()
            .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '-')
        {
            return Err(DomainNameError::InvalidCharacter(ch));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(DomainNameError::InvalidLabelFormat(label.to_string()));
        }

        Ok(())
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `www.` alias of this name
    pub fn www(&self) -> String {
        format!("www.{}", self.0)
    }

    /// Whether `self` equals `zone` or sits underneath it
    pub fn is_within(&self, zone: &DomainName) -> bool {
        self.0 == zone.0 || self.0.ends_with(&format!(".{}", zone.0))
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DomainName {
    type Err = DomainNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DomainName {
    type Error = DomainNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DomainName> for String {
    fn from(value: DomainName) -> Self {
        value.0
    }
}

/// Container image reference (`registry/repository:tag`)
///
/// The reference is opaque to synthesis; it only has to be a single
/// non-empty token that a registry could resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageReference(String);

impl ImageReference {
    /// Create an image reference, rejecting empty or whitespace-containing input
    pub fn new(reference: impl AsRef<str>) -> Result<Self, ImageReferenceError> {
        let reference = reference.as_ref().trim();
        if reference.is_empty() {
            return Err(ImageReferenceError::Empty);
        }
        if reference.chars().any(char::is_whitespace) {
            return Err(ImageReferenceError::Whitespace(reference.to_string()));
        }
        Ok(Self(reference.to_string()))
    }

    /// Get the reference as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_domain_names() {
        assert!(DomainName::new("example.com").is_ok());
        assert!(DomainName::new("lks0426.com").is_ok());
        assert!(DomainName::new("my-site.example.co.uk").is_ok());
        assert!(DomainName::new("localhost").is_ok());
    }

    #[test]
    fn test_domain_name_is_normalized() {
        let domain = DomainName::new(" Example.COM. ").unwrap();
        assert_eq!(domain.as_str(), "example.com");
    }

    #[test]
    fn test_invalid_domain_names() {
        assert_eq!(DomainName::new(""), Err(DomainNameError::Empty));
        assert!(matches!(
            DomainName::new("-example.com"),
            Err(DomainNameError::InvalidLabelFormat(_))
        ));
        assert!(matches!(
            DomainName::new("example..com"),
            Err(DomainNameError::EmptyLabel(_))
        ));
        assert!(matches!(
            DomainName::new("exa_mple.com"),
            Err(DomainNameError::InvalidCharacter('_'))
        ));
        assert!(matches!(
            DomainName::new("example.123"),
            Err(DomainNameError::NumericTld(_))
        ));
    }

    #[test]
    fn test_domain_length_limits() {
        let long_label = "a".repeat(64);
        assert!(matches!(
            DomainName::new(format!("{long_label}.com")),
            Err(DomainNameError::LabelTooLong(_))
        ));

        let too_long = format!("{}.com", vec!["a".repeat(60); 5].join("."));
        assert!(matches!(
            DomainName::new(too_long),
            Err(DomainNameError::TooLong(_))
        ));
    }

    #[test]
    fn test_is_within_zone() {
        let zone = DomainName::new("example.com").unwrap();
        assert!(DomainName::new("example.com").unwrap().is_within(&zone));
        assert!(DomainName::new("www.example.com").unwrap().is_within(&zone));
        assert!(!DomainName::new("badexample.com").unwrap().is_within(&zone));
    }

    #[test]
    fn test_domain_serde() {
        let domain: DomainName = serde_json::from_str("\"example.com\"").unwrap();
        assert_eq!(domain.as_str(), "example.com");
        assert!(serde_json::from_str::<DomainName>("\"bad..name\"").is_err());
    }

    #[test]
    fn test_image_reference() {
        assert!(ImageReference::new("lks0426/lks0426-portfolio:latest").is_ok());
        assert_eq!(ImageReference::new("  "), Err(ImageReferenceError::Empty));
        assert_eq!(
            ImageReference::new("bad image"),
            Err(ImageReferenceError::Whitespace("bad image".to_string()))
        );
    }
}
