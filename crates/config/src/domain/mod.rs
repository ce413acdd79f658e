//! Domain configuration
//!
//! Provides a layered configuration system:
//! 1. Base config (config/base/defaults.yaml)
//! 2. Domain config (config/domains/{domain}/domain.yaml)
//!
//! The merged document is validated and compiled into an immutable
//! `DomainConfiguration`. The engine holds it behind an atomic pointer, so a
//! domain switch never affects requests already in flight.

mod document;
mod endpoints;
mod validation_rules;
mod validator;
mod vocabulary;

pub use document::{
    merge_json, DomainDocument, DomainIndicatorsDocument, DomainTermsDocument, EndpointDocument,
    TopicRedirectDocument, ValidationRulesDocument, VocabularyDocument,
};
pub use endpoints::{EndpointSpec, DEFAULT_ENDPOINT_THRESHOLD};
pub use validation_rules::{
    CompiledRejectionPattern, DomainIndicators, TermMatcher, TopicRedirect, ValidationRules,
};
pub use validator::{ConfigLint, DomainValidator, LintKind};
pub use vocabulary::{DomainTerms, DomainVocabulary};

use geo_router_core::EndpointId;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::ConfigError;

/// Validated, compiled configuration of one business vertical
#[derive(Debug, Clone)]
pub struct DomainConfiguration {
    pub name: String,
    pub version: String,
    pub vocabulary: DomainVocabulary,
    pub endpoint_mappings: BTreeMap<EndpointId, EndpointSpec>,
    pub avoid_terms: BTreeMap<EndpointId, BTreeSet<String>>,
    pub validation_rules: ValidationRules,
    /// Non-fatal findings from load
    pub lints: Vec<ConfigLint>,
}

impl DomainConfiguration {
    /// Validate a parsed document with default options
    pub fn load(doc: DomainDocument) -> Result<Self, ConfigError> {
        let config = DomainValidator::new().build(doc)?;
        tracing::info!(
            domain = %config.name,
            version = %config.version,
            endpoints = config.endpoint_mappings.len(),
            terms = config.vocabulary.term_count(),
            lints = config.lints.len(),
            "Loaded domain configuration"
        );
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Self::load(DomainDocument::from_yaml_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Self::load(DomainDocument::from_json_str(content)?)
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load(DomainDocument::load_file(path)?)
    }

    pub fn endpoint(&self, id: &EndpointId) -> Option<&EndpointSpec> {
        self.endpoint_mappings.get(id)
    }

    /// Avoid terms of an endpoint (empty when none configured)
    pub fn avoid_terms_for(&self, id: &EndpointId) -> impl Iterator<Item = &str> {
        self.avoid_terms
            .get(id)
            .into_iter()
            .flat_map(|terms| terms.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RETAIL: &str = r#"
name: retail
version: "1.2"
vocabulary:
  entities:
    location: [area, region, neighborhood]
  domain_terms:
    primary: [market, store]
    secondary: [customer]
    context: [area]
  synonyms:
    rival: [competitor]
endpoint_mappings:
  /competitive-analysis:
    display_name: Competitive Analysis
    primary_intents: [competitive_analysis, performance_ranking]
    required_fields: [store_count, market_share]
    boost_terms: [competitive, advantage]
    confidence_threshold: 0.6
  /demographic-insights:
    primary_intents: [demographic_analysis]
    required_fields: [population]
avoid_terms:
  /demographic-insights: [competitor, competitive]
validation_rules:
  rejection_patterns:
    general_knowledge: [weather, forecast]
  domain_indicators:
    required_subjects: [market, store, area]
    required_actions: [analyze, show]
    valid_contexts: [region]
"#;

    #[test]
    fn test_load_from_yaml() {
        let config = DomainConfiguration::from_yaml_str(RETAIL).unwrap();
        assert_eq!(config.name, "retail");
        assert_eq!(config.version, "1.2");

        let demo = EndpointId::parse("/demographic-insights").unwrap();
        let avoid: Vec<&str> = config.avoid_terms_for(&demo).collect();
        assert_eq!(avoid, vec!["competitive", "competitor"]);
        assert_eq!(
            config.endpoint(&demo).unwrap().confidence_threshold,
            DEFAULT_ENDPOINT_THRESHOLD
        );

        let comp = EndpointId::parse("/competitive-analysis").unwrap();
        assert_eq!(config.avoid_terms_for(&comp).count(), 0);
        assert_eq!(config.validation_rules.rejection_patterns.len(), 1);
    }

    #[test]
    fn test_json_equivalent() {
        let value: serde_json::Value = serde_yaml::from_str(RETAIL).unwrap();
        let json = serde_json::to_string(&value).unwrap();
        let config = DomainConfiguration::from_json_str(&json).unwrap();
        assert_eq!(config.endpoint_mappings.len(), 2);
    }
}
