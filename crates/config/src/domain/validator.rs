//! Domain document validator
//!
//! Turns a raw `DomainDocument` into a `DomainConfiguration`. Performs:
//! - Required section checks
//! - Identifier and intent validation
//! - Value range validation
//! - Cross-reference validation (avoid terms -> endpoints)
//! - Synonym cycle detection
//! - Pattern compilation
//!
//! Any failure is fatal to the load. Non-fatal findings are returned as
//! `ConfigLint`s and logged at warn level.
//!
//! # Example
//!
//! ```ignore
//! use geo_router_config::{DomainDocument, DomainValidator};
//!
//! let doc = DomainDocument::load_domain("retail", "config")?;
//! let config = DomainValidator::new().with_max_synonym_cycle(3).build(doc)?;
//! ```

use geo_router_core::{BaseIntent, EndpointId, FieldName};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::document::DomainDocument;
use super::endpoints::{EndpointSpec, DEFAULT_ENDPOINT_THRESHOLD};
use super::validation_rules::ValidationRules;
use super::vocabulary::DomainVocabulary;
use super::DomainConfiguration;
use crate::ConfigError;

/// Kind of non-fatal finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintKind {
    NoRequiredFields,
    EmptyDomainTerms,
    AvoidTermIsBoostTerm,
    NoRejectionPatterns,
    NoDomainIndicators,
}

/// Non-fatal configuration finding
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLint {
    pub kind: LintKind,
    /// Section or endpoint the finding is about
    pub source: String,
    pub message: String,
}

impl fmt::Display for ConfigLint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.kind, self.source, self.message)
    }
}

/// Domain validator
pub struct DomainValidator {
    /// Longest synonym cycle tolerated (a <-> b pairs have length 2)
    max_synonym_cycle: usize,
    /// Whether lints are collected
    include_warnings: bool,
}

impl Default for DomainValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainValidator {
    pub fn new() -> Self {
        Self {
            max_synonym_cycle: 2,
            include_warnings: true,
        }
    }

    pub fn with_max_synonym_cycle(mut self, bound: usize) -> Self {
        self.max_synonym_cycle = bound;
        self
    }

    pub fn with_warnings(mut self, include: bool) -> Self {
        self.include_warnings = include;
        self
    }

    /// Validate and compile a document
    pub fn build(&self, doc: DomainDocument) -> Result<DomainConfiguration, ConfigError> {
        let name = doc.name.trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::MissingField("name".to_string()));
        }

        let endpoint_mappings = self.validate_endpoints(&doc)?;
        let avoid_terms = self.validate_avoid_terms(&doc, &endpoint_mappings)?;

        let vocabulary = DomainVocabulary::from_document(&doc.vocabulary);
        self.validate_synonyms(&vocabulary)?;

        let validation_rules = ValidationRules::compile(&doc.validation_rules)?;

        let lints = if self.include_warnings {
            self.lint(&vocabulary, &endpoint_mappings, &avoid_terms, &validation_rules)
        } else {
            Vec::new()
        };
        for lint in &lints {
            tracing::warn!(domain = %name, kind = ?lint.kind, source = %lint.source, "{}", lint.message);
        }

        Ok(DomainConfiguration {
            name,
            version: doc.version,
            vocabulary,
            endpoint_mappings,
            avoid_terms,
            validation_rules,
            lints,
        })
    }

    fn validate_endpoints(
        &self,
        doc: &DomainDocument,
    ) -> Result<BTreeMap<EndpointId, EndpointSpec>, ConfigError> {
        if doc.endpoint_mappings.is_empty() {
            return Err(ConfigError::MissingField("endpoint_mappings".to_string()));
        }

        let mut endpoints = BTreeMap::new();
        for (raw_id, raw) in &doc.endpoint_mappings {
            let id = EndpointId::parse(raw_id)?;
            if endpoints.contains_key(&id) {
                return Err(ConfigError::DuplicateEndpoint(id.to_string()));
            }

            if raw.primary_intents.is_empty() {
                return Err(ConfigError::MissingField(format!(
                    "endpoint_mappings.{}.primary_intents",
                    raw_id
                )));
            }
            let mut primary_intents = BTreeSet::new();
            for intent in &raw.primary_intents {
                let parsed: BaseIntent =
                    intent.parse().map_err(|_| ConfigError::UnknownIntent {
                        endpoint: id.to_string(),
                        intent: intent.clone(),
                    })?;
                primary_intents.insert(parsed);
            }

            let confidence_threshold = raw.confidence_threshold.unwrap_or(DEFAULT_ENDPOINT_THRESHOLD);
            if !(0.0..=1.0).contains(&confidence_threshold) {
                return Err(ConfigError::InvalidRange {
                    field: format!("endpoint_mappings.{}.confidence_threshold", raw_id),
                    value: confidence_threshold,
                    expected: "[0, 1]".to_string(),
                });
            }

            let required_fields = raw
                .required_fields
                .iter()
                .map(|f| FieldName::parse(f))
                .collect::<Result<BTreeSet<_>, _>>()?;

            let display_name = raw
                .display_name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| EndpointSpec::default_display_name(&id));

            endpoints.insert(
                id.clone(),
                EndpointSpec {
                    id,
                    display_name,
                    description: raw.description.trim().to_string(),
                    primary_intents,
                    required_fields,
                    boost_terms: lowercase_set(&raw.boost_terms),
                    penalty_terms: lowercase_set(&raw.penalty_terms),
                    confidence_threshold,
                },
            );
        }
        Ok(endpoints)
    }

    fn validate_avoid_terms(
        &self,
        doc: &DomainDocument,
        endpoints: &BTreeMap<EndpointId, EndpointSpec>,
    ) -> Result<BTreeMap<EndpointId, BTreeSet<String>>, ConfigError> {
        let mut avoid = BTreeMap::new();
        for (raw_id, terms) in &doc.avoid_terms {
            let id = EndpointId::parse(raw_id)?;
            let spec = endpoints
                .get(&id)
                .ok_or_else(|| ConfigError::UnknownEndpointReference(id.to_string()))?;

            let terms = lowercase_set(terms);
            let self_names = [
                id.as_str().to_string(),
                id.as_str()[1..].to_string(),
                id.as_phrase(),
                spec.display_name.to_lowercase(),
            ];
            if let Some(term) = terms.iter().find(|t| self_names.contains(t)) {
                return Err(ConfigError::SelfAvoidance {
                    endpoint: id.to_string(),
                    term: term.clone(),
                });
            }

            avoid.entry(id).or_insert_with(BTreeSet::new).extend(terms);
        }
        Ok(avoid)
    }

    fn validate_synonyms(&self, vocabulary: &DomainVocabulary) -> Result<(), ConfigError> {
        if let Some(cycle) = find_long_cycle(&vocabulary.synonyms, self.max_synonym_cycle) {
            return Err(ConfigError::CyclicSynonym {
                cycle,
                bound: self.max_synonym_cycle,
            });
        }
        Ok(())
    }

    fn lint(
        &self,
        vocabulary: &DomainVocabulary,
        endpoints: &BTreeMap<EndpointId, EndpointSpec>,
        avoid_terms: &BTreeMap<EndpointId, BTreeSet<String>>,
        rules: &ValidationRules,
    ) -> Vec<ConfigLint> {
        let mut lints = Vec::new();

        for (id, spec) in endpoints {
            if spec.required_fields.is_empty() {
                lints.push(ConfigLint {
                    kind: LintKind::NoRequiredFields,
                    source: id.to_string(),
                    message: "Endpoint has no required fields; field availability cannot inform its score".into(),
                });
            }
            if let Some(avoid) = avoid_terms.get(id) {
                let overlap: Vec<&String> = avoid.intersection(&spec.boost_terms).collect();
                if !overlap.is_empty() {
                    lints.push(ConfigLint {
                        kind: LintKind::AvoidTermIsBoostTerm,
                        source: id.to_string(),
                        message: format!("Terms are both boosted and avoided: {:?}", overlap),
                    });
                }
            }
        }

        let terms = &vocabulary.domain_terms;
        for (tier, set) in [
            ("primary", &terms.primary),
            ("secondary", &terms.secondary),
            ("context", &terms.context),
        ] {
            if set.is_empty() {
                lints.push(ConfigLint {
                    kind: LintKind::EmptyDomainTerms,
                    source: format!("vocabulary.domain_terms.{}", tier),
                    message: "Domain term list is empty".into(),
                });
            }
        }

        if rules.rejection_patterns.iter().all(|p| p.matcher.is_empty()) {
            lints.push(ConfigLint {
                kind: LintKind::NoRejectionPatterns,
                source: "validation_rules.rejection_patterns".into(),
                message: "No rejection patterns; only relevance can reject queries".into(),
            });
        }

        let indicators = &rules.domain_indicators;
        if indicators.subjects.is_empty()
            && indicators.actions.is_empty()
            && indicators.contexts.is_empty()
        {
            lints.push(ConfigLint {
                kind: LintKind::NoDomainIndicators,
                source: "validation_rules.domain_indicators".into(),
                message: "No domain indicators; every query will score zero relevance".into(),
            });
        }

        lints
    }
}

fn lowercase_set(terms: &[String]) -> BTreeSet<String> {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Search for a simple cycle in the directed synonym graph that is longer
/// than `bound`. Self-loops are ignored.
///
/// Each cycle is enumerated once, from its smallest node, by only extending
/// paths through nodes that sort after the start. Finished nodes are not
/// pruned, so cycles that re-enter an explored region are still found.
fn find_long_cycle(
    graph: &BTreeMap<String, BTreeSet<String>>,
    bound: usize,
) -> Option<Vec<String>> {
    fn extend<'a>(
        start: &'a str,
        node: &'a str,
        graph: &'a BTreeMap<String, BTreeSet<String>>,
        bound: usize,
        on_path: &mut BTreeSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        let targets = graph.get(node)?;
        for target in targets {
            let target = target.as_str();
            if target == node {
                continue;
            }
            if target == start {
                if path.len() > bound {
                    let mut cycle: Vec<String> = path.iter().map(|s| s.to_string()).collect();
                    cycle.push(start.to_string());
                    return Some(cycle);
                }
                continue;
            }
            if target < start || on_path.contains(target) {
                continue;
            }
            on_path.insert(target);
            path.push(target);
            if let Some(cycle) = extend(start, target, graph, bound, on_path, path) {
                return Some(cycle);
            }
            path.pop();
            on_path.remove(target);
        }
        None
    }

    for start in graph.keys() {
        let start = start.as_str();
        let mut on_path = BTreeSet::from([start]);
        let mut path = vec![start];
        if let Some(cycle) = extend(start, start, graph, bound, &mut on_path, &mut path) {
            return Some(cycle);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::EndpointDocument;

    fn endpoint(intents: &[&str]) -> EndpointDocument {
        EndpointDocument {
            display_name: None,
            description: "test endpoint".into(),
            primary_intents: intents.iter().map(|s| s.to_string()).collect(),
            required_fields: vec!["population".into()],
            boost_terms: vec![],
            penalty_terms: vec![],
            confidence_threshold: Some(0.6),
        }
    }

    fn document() -> DomainDocument {
        let mut doc = DomainDocument {
            name: "retail".into(),
            ..Default::default()
        };
        doc.endpoint_mappings
            .insert("/demographic-insights".into(), endpoint(&["demographic_analysis"]));
        doc.endpoint_mappings
            .insert("/competitive-analysis".into(), endpoint(&["competitive_analysis"]));
        doc
    }

    #[test]
    fn test_valid_document() {
        let config = DomainValidator::new().build(document()).unwrap();
        assert_eq!(config.endpoint_mappings.len(), 2);
        let spec = config
            .endpoint(&EndpointId::parse("/competitive-analysis").unwrap())
            .unwrap();
        assert_eq!(spec.display_name, "Competitive Analysis");
        // empty vocabulary and rules produce lints, not errors
        assert!(config
            .lints
            .iter()
            .any(|l| l.kind == LintKind::EmptyDomainTerms));
    }

    #[test]
    fn test_missing_name_and_endpoints() {
        let mut doc = document();
        doc.name = " ".into();
        assert_eq!(
            DomainValidator::new().build(doc).unwrap_err(),
            ConfigError::MissingField("name".into())
        );

        let doc = DomainDocument {
            name: "empty".into(),
            ..Default::default()
        };
        assert!(matches!(
            DomainValidator::new().build(doc),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn test_empty_intents_and_unknown_intent() {
        let mut doc = document();
        doc.endpoint_mappings.insert("/empty".into(), endpoint(&[]));
        assert!(matches!(
            DomainValidator::new().build(doc),
            Err(ConfigError::MissingField(f)) if f.contains("primary_intents")
        ));

        let mut doc = document();
        doc.endpoint_mappings.insert("/weird".into(), endpoint(&["astrology"]));
        assert!(matches!(
            DomainValidator::new().build(doc),
            Err(ConfigError::UnknownIntent { .. })
        ));
    }

    #[test]
    fn test_threshold_range() {
        let mut doc = document();
        let mut bad = endpoint(&["optimization"]);
        bad.confidence_threshold = Some(1.5);
        doc.endpoint_mappings.insert("/optimize".into(), bad);
        assert!(matches!(
            DomainValidator::new().build(doc),
            Err(ConfigError::InvalidRange { value, .. }) if value == 1.5
        ));
    }

    #[test]
    fn test_duplicate_after_normalization() {
        let mut doc = document();
        doc.endpoint_mappings
            .insert("Competitive-Analysis".into(), endpoint(&["competitive_analysis"]));
        assert!(matches!(
            DomainValidator::new().build(doc),
            Err(ConfigError::DuplicateEndpoint(id)) if id == "/competitive-analysis"
        ));
    }

    #[test]
    fn test_self_avoidance_and_unknown_reference() {
        let mut doc = document();
        doc.avoid_terms.insert(
            "/competitive-analysis".into(),
            vec!["demographic".into(), "Competitive Analysis".into()],
        );
        assert!(matches!(
            DomainValidator::new().build(doc),
            Err(ConfigError::SelfAvoidance { .. })
        ));

        let mut doc = document();
        doc.avoid_terms.insert("/nowhere".into(), vec!["x".into()]);
        assert_eq!(
            DomainValidator::new().build(doc).unwrap_err(),
            ConfigError::UnknownEndpointReference("/nowhere".into())
        );
    }

    #[test]
    fn test_invalid_identifiers() {
        let mut doc = document();
        doc.endpoint_mappings
            .insert("/has space".into(), endpoint(&["optimization"]));
        assert!(matches!(
            DomainValidator::new().build(doc),
            Err(ConfigError::InvalidIdentifier(_))
        ));

        let mut doc = document();
        let mut bad = endpoint(&["optimization"]);
        bad.required_fields = vec!["bad field".into()];
        doc.endpoint_mappings.insert("/optimize".into(), bad);
        assert!(matches!(
            DomainValidator::new().build(doc),
            Err(ConfigError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_synonym_cycles() {
        let mut doc = document();
        doc.vocabulary.synonyms.insert("rival".into(), vec!["competitor".into()]);
        doc.vocabulary.synonyms.insert("competitor".into(), vec!["rival".into()]);
        doc.vocabulary.synonyms.insert("store".into(), vec!["store".into()]);
        assert!(DomainValidator::new().build(doc.clone()).is_ok());

        doc.vocabulary.synonyms.insert("competitor".into(), vec!["opponent".into()]);
        doc.vocabulary.synonyms.insert("opponent".into(), vec!["rival".into()]);
        let err = DomainValidator::new().build(doc.clone()).unwrap_err();
        match err {
            ConfigError::CyclicSynonym { cycle, bound } => {
                assert_eq!(bound, 2);
                assert_eq!(cycle.first(), cycle.last());
                assert_eq!(cycle.len(), 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(DomainValidator::new()
            .with_max_synonym_cycle(3)
            .build(doc)
            .is_ok());
    }

    #[test]
    fn test_long_cycle_through_explored_node() {
        let mut doc = document();
        doc.vocabulary
            .synonyms
            .insert("a".into(), vec!["b".into(), "c".into()]);
        doc.vocabulary.synonyms.insert("b".into(), vec!["a".into()]);
        doc.vocabulary.synonyms.insert("c".into(), vec!["b".into()]);

        // a -> b -> a is short, a -> c -> b -> a is not
        match DomainValidator::new().build(doc.clone()).unwrap_err() {
            ConfigError::CyclicSynonym { cycle, bound } => {
                assert_eq!(bound, 2);
                assert_eq!(cycle, vec!["a", "c", "b", "a"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(DomainValidator::new()
            .with_max_synonym_cycle(3)
            .build(doc)
            .is_ok());
    }

    #[test]
    fn test_chained_mutual_synonyms_are_short_cycles() {
        let mut doc = document();
        doc.vocabulary.synonyms.insert("shop".into(), vec!["store".into()]);
        doc.vocabulary
            .synonyms
            .insert("store".into(), vec!["shop".into(), "outlet".into()]);
        doc.vocabulary.synonyms.insert("outlet".into(), vec!["store".into()]);
        assert!(DomainValidator::new().build(doc).is_ok());
    }

    #[test]
    fn test_avoid_boost_overlap_lint() {
        let mut doc = document();
        if let Some(ep) = doc.endpoint_mappings.get_mut("/demographic-insights") {
            ep.boost_terms = vec!["income".into()];
        }
        doc.avoid_terms
            .insert("/demographic-insights".into(), vec!["income".into()]);
        let config = DomainValidator::new().build(doc).unwrap();
        assert!(config
            .lints
            .iter()
            .any(|l| l.kind == LintKind::AvoidTermIsBoostTerm));

        let quiet = DomainValidator::new().with_warnings(false).build(document()).unwrap();
        assert!(quiet.lints.is_empty());
    }
}
