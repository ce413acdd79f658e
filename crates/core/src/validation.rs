//! Scope validation result

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope classification of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryScope {
    InScope,
    Borderline,
    OutOfScope,
    Malformed,
}

impl QueryScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InScope => "in_scope",
            Self::Borderline => "borderline",
            Self::OutOfScope => "out_of_scope",
            Self::Malformed => "malformed",
        }
    }
}

impl fmt::Display for QueryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the query validator, created fresh per query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub scope: QueryScope,
    /// Confidence in the scope decision (0.0 - 1.0)
    pub confidence: f64,
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_message: Option<String>,
    /// Rejection topic detected (e.g. `weather`, `technical_support`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Raw domain relevance in `[0, 1]`
    pub domain_relevance: f64,
}

impl ValidationResult {
    pub fn new(scope: QueryScope, confidence: f64, domain_relevance: f64) -> Self {
        Self {
            scope,
            confidence: confidence.clamp(0.0, 1.0),
            reasons: Vec::new(),
            suggestions: Vec::new(),
            redirect_message: None,
            topic: None,
            domain_relevance: domain_relevance.clamp(0.0, 1.0),
        }
    }

    pub fn in_scope(confidence: f64, domain_relevance: f64) -> Self {
        Self::new(QueryScope::InScope, confidence, domain_relevance)
    }

    /// Malformed input; always carries a rephrasing hint
    pub fn malformed(reason: impl Into<String>) -> Self {
        let mut result = Self::new(QueryScope::Malformed, 1.0, 0.0);
        result.reasons.push(reason.into());
        result.suggestions.push(
            "Ask a complete question, e.g. \"Which areas have the highest median income?\"".into(),
        );
        result
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reasons.push(reason.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_redirect(mut self, message: impl Into<String>) -> Self {
        self.redirect_message = Some(message.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Whether routing must stop here regardless of candidates
    pub fn is_terminal_rejection(&self, high_confidence: f64) -> bool {
        match self.scope {
            QueryScope::Malformed => true,
            QueryScope::OutOfScope => self.confidence >= high_confidence,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_rejection() {
        let oos = ValidationResult::new(QueryScope::OutOfScope, 0.9, 0.0);
        assert!(oos.is_terminal_rejection(0.8));

        let soft = ValidationResult::new(QueryScope::OutOfScope, 0.6, 0.05);
        assert!(!soft.is_terminal_rejection(0.8));

        assert!(ValidationResult::malformed("empty query").is_terminal_rejection(0.8));
        assert!(!ValidationResult::in_scope(0.9, 0.8).is_terminal_rejection(0.8));
    }

    #[test]
    fn test_malformed_has_suggestion() {
        let result = ValidationResult::malformed("punctuation only");
        assert_eq!(result.scope, QueryScope::Malformed);
        assert!(!result.suggestions.is_empty());
    }

    #[test]
    fn test_serialization_skips_empty() {
        let json = serde_json::to_value(ValidationResult::in_scope(0.8, 0.7)).unwrap();
        assert_eq!(json["scope"], "in_scope");
        assert!(json.get("redirect_message").is_none());
        assert!(json.get("suggestions").is_none());
    }
}
