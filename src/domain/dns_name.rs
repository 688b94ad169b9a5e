// Copyright (c) 2025 - Cowboy AI, Inc.
//! DNS Name Value Objects with RFC 1123 Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// DNS name validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DnsNameError {
    #[error("DNS name is empty")]
    Empty,

    #[error("DNS name exceeds maximum length of 253 characters: {0}")]
    TooLong(usize),

    #[error("Label exceeds maximum length of 63 characters: {0}")]
    LabelTooLong(String),

    #[error("Invalid character in DNS name: {0:?}")]
    InvalidCharacter(char),

    #[error("Label cannot start or end with hyphen: {0}")]
    InvalidLabelFormat(String),

    #[error("Top-level label cannot be all numeric: {0}")]
    NumericLabel(String),

    #[error("Expected a single label, got a dotted name: {0}")]
    NotALabel(String),
}

/// Validate a single DNS label
fn validate_label(label: &str) -> Result<(), DnsNameError> {
    if label.is_empty() {
        return Err(DnsNameError::Empty);
    }

    if label.len() > DnsName::MAX_LABEL_LENGTH {
        return Err(DnsNameError::LabelTooLong(label.to_string()));
    }

    if let Some(ch) = label
        .chars()
        .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '-')
    {
        return Err(DnsNameError::InvalidCharacter(ch));
    }

    if label.starts_with('-') || label.ends_with('-') {
        return Err(DnsNameError::InvalidLabelFormat(label.to_string()));
    }

    Ok(())
}

/// Fully qualified domain name, used for hosted zone lookups
///
/// Canonical form is lowercase without a trailing dot, so `Aws.Domain.com.`
/// and `aws.domain.com` name the same zone.
///
/// # Examples
///
/// ```rust
/// use cim_cluster_topology::domain::DnsName;
///
/// let zone = DnsName::new("Aws.Domain.com.").unwrap();
/// assert_eq!(zone.as_str(), "aws.domain.com");
/// assert!(DnsName::new("-bad.example.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DnsName(String);

impl DnsName {
    /// Maximum total length for an FQDN (RFC 1123)
    pub const MAX_LENGTH: usize = 253;

    /// Maximum length for a single label (RFC 1123)
    pub const MAX_LABEL_LENGTH: usize = 63;

    /// Create a DNS name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, DnsNameError> {
        let name = name.into();
        let name = name.strip_suffix('.').unwrap_or(&name).to_ascii_lowercase();

        if name.is_empty() {
            return Err(DnsNameError::Empty);
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(DnsNameError::TooLong(name.len()));
        }

        for label in name.split('.') {
            validate_label(label)?;
        }

        if let Some(tld) = name.rsplit('.').next() {
            if tld.chars().all(|c| c.is_ascii_digit()) {
                return Err(DnsNameError::NumericLabel(tld.to_string()));
            }
        }

        Ok(Self(name))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Qualify a label under this name (`label.zone`)
    ///
    /// Fails when the qualified name exceeds 253 characters.
    pub fn qualify(&self, label: &DnsLabel) -> Result<String, DnsNameError> {
        let fqdn = format!("{}.{}", label.as_str(), self.0);
        if fqdn.len() > Self::MAX_LENGTH {
            return Err(DnsNameError::TooLong(fqdn.len()));
        }
        Ok(fqdn)
    }
}

impl fmt::Display for DnsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DnsName {
    type Error = DnsNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for DnsName {
    type Error = DnsNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DnsName> for String {
    fn from(value: DnsName) -> Self {
        value.0
    }
}

/// A single DNS label (no dots), e.g. the cluster record name `k8s-dev`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DnsLabel(String);

impl DnsLabel {
    /// Create a label with validation
    pub fn new(label: impl Into<String>) -> Result<Self, DnsNameError> {
        let label = label.into().to_ascii_lowercase();
        if label.contains('.') {
            return Err(DnsNameError::NotALabel(label));
        }
        validate_label(&label)?;
        Ok(Self(label))
    }

    pub(super) fn new_unchecked(label: &str) -> Self {
        Self(label.to_string())
    }

    /// Derive the per-index label `<label>-<index>`
    ///
    /// Fails only when the suffix pushes the label past 63 characters.
    pub fn indexed(&self, index: usize) -> Result<Self, DnsNameError> {
        Self::new(format!("{}-{}", self.0, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DnsLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DnsLabel {
    type Error = DnsNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DnsLabel> for String {
    fn from(value: DnsLabel) -> Self {
        value.0
    }
}
