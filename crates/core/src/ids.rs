//! Validated identifier newtypes
//!
//! Endpoint ids and field names are only ever constructed through `parse`,
//! which the configuration loader calls while reading a domain document.
//! Once a value of these types exists it is known to be well-formed, so maps
//! keyed by them cannot hold garbage keys past load time.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors produced when an identifier fails validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("identifier is empty")]
    Empty,

    #[error("invalid endpoint id '{0}': expected '/segment[-segment]' of lowercase ascii, digits, '-' or '_'")]
    InvalidEndpoint(String),

    #[error("invalid field name '{0}': expected ascii letters, digits, '_' or '.'")]
    InvalidField(String),

    #[error("invalid category '{0}'")]
    InvalidCategory(String),
}

/// Identifier of an analysis endpoint (e.g. `/competitive-analysis`)
///
/// Normalized on parse: surrounding whitespace removed, lower-cased, and a
/// leading `/` added when absent. Two spellings of one endpoint therefore
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EndpointId(String);

impl EndpointId {
    /// Parse and normalize an endpoint id
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }

        let lowered = trimmed.to_lowercase();
        let normalized = if lowered.starts_with('/') {
            lowered
        } else {
            format!("/{}", lowered)
        };

        let body = &normalized[1..];
        let valid = !body.is_empty()
            && body
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
            && !body.starts_with('-')
            && !body.ends_with('-');

        if !valid {
            return Err(IdError::InvalidEndpoint(raw.to_string()));
        }

        Ok(Self(normalized))
    }

    /// The normalized id string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id without the leading slash, with dashes turned into spaces
    ///
    /// Used to detect an endpoint naming itself in its own avoid-terms.
    pub fn as_phrase(&self) -> String {
        self.0[1..].replace(['-', '_'], " ")
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EndpointId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EndpointId> for String {
    fn from(id: EndpointId) -> Self {
        id.0
    }
}

impl AsRef<str> for EndpointId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Name of a dataset field (e.g. `median_income`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldName(String);

impl FieldName {
    /// Parse a field name; case is preserved but whitespace is trimmed
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        let valid = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if !valid {
            return Err(IdError::InvalidField(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FieldName {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FieldName> for String {
    fn from(name: FieldName) -> Self {
        name.0
    }
}

/// Dataset field category (e.g. `demographic`, `competitive`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(IdError::Empty);
        }
        if normalized.chars().any(|c| c.is_whitespace()) {
            return Err(IdError::InvalidCategory(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Category {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_normalization() {
        let a = EndpointId::parse("  Competitive-Analysis ").unwrap();
        let b = EndpointId::parse("/competitive-analysis").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "/competitive-analysis");
        assert_eq!(a.as_phrase(), "competitive analysis");
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        assert_eq!(EndpointId::parse("   "), Err(IdError::Empty));
        assert!(EndpointId::parse("/").is_err());
        assert!(EndpointId::parse("/has space").is_err());
        assert!(EndpointId::parse("/-leading").is_err());
        assert!(EndpointId::parse("/a/b").is_err());
    }

    #[test]
    fn test_field_name() {
        assert_eq!(FieldName::parse(" median_income ").unwrap().as_str(), "median_income");
        assert!(FieldName::parse("bad field").is_err());
        assert!(FieldName::parse("").is_err());
    }

    #[test]
    fn test_serde_goes_through_parse() {
        let id: EndpointId = serde_json::from_str("\"Demographic-Insights\"").unwrap();
        assert_eq!(id.as_str(), "/demographic-insights");

        let bad: Result<EndpointId, _> = serde_json::from_str("\"no spaces allowed\"");
        assert!(bad.is_err());
    }
}
