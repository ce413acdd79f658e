//! Domain vocabulary adapter
//!
//! Bridges the domain-agnostic intent ranking and one vertical's endpoints.
//! Query tokens are normalized and expanded through the synonym graph, domain
//! relevance is measured against the weighted domain terms, and every endpoint
//! serving one of the top intents becomes a candidate. Endpoint boost, penalty
//! and avoid terms then adjust each candidate in bounded steps.
//!
//! All configured terms are stemmed with the query tokenizer when the domain
//! is activated, so matching is a token-sequence comparison on both sides.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use geo_router_config::{AdapterSettings, DomainConfiguration};
use geo_router_core::{
    sort_candidates, EndpointCandidate, EndpointId, PenaltyKind, QueryPattern, RankedIntents,
};
use geo_router_text_processing::{stem_phrase, BaseIntentClassifier, TokenizedQuery};

use crate::{EngineError, Result};

/// A configured term with its stemmed phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedTerm {
    pub term: String,
    phrase: Vec<String>,
}

impl IndexedTerm {
    /// `None` when nothing is left after stopword removal
    fn new(term: &str) -> Option<Self> {
        let phrase = stem_phrase(term);
        if phrase.is_empty() {
            None
        } else {
            Some(Self {
                term: term.to_string(),
                phrase,
            })
        }
    }

    pub fn phrase(&self) -> &[String] {
        &self.phrase
    }

    pub fn matches(&self, tokens: &[String]) -> bool {
        contains_phrase(tokens, &self.phrase)
    }
}

fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty()
        && phrase.len() <= tokens.len()
        && tokens.windows(phrase.len()).any(|w| w == phrase)
}

fn index_terms<'a>(terms: impl IntoIterator<Item = &'a String>) -> Vec<IndexedTerm> {
    terms.into_iter().filter_map(|t| IndexedTerm::new(t)).collect()
}

fn matched<'a>(terms: &'a [IndexedTerm], token_sets: &[&[String]]) -> Vec<&'a str> {
    terms
        .iter()
        .filter(|t| token_sets.iter().any(|tokens| t.matches(tokens)))
        .map(|t| t.term.as_str())
        .collect()
}

/// Directed rewrite of a domain term to its generic equivalent
#[derive(Debug, Clone)]
struct Normalization {
    from: IndexedTerm,
    to: IndexedTerm,
}

/// Stemmed per-endpoint term lists
#[derive(Debug, Clone, Default)]
struct EndpointTerms {
    boost: Vec<IndexedTerm>,
    penalty: Vec<IndexedTerm>,
    avoid: Vec<IndexedTerm>,
}

/// Stemmed view of a domain vocabulary, built once per activation
#[derive(Debug, Clone, Default)]
pub struct VocabularyIndex {
    /// Longest source phrase first
    normalizations: Vec<Normalization>,
    expansions: Vec<(IndexedTerm, Vec<IndexedTerm>)>,
    entities: Vec<(String, Vec<IndexedTerm>)>,
    qualifiers: Vec<(String, Vec<IndexedTerm>)>,
    primary: Vec<IndexedTerm>,
    secondary: Vec<IndexedTerm>,
    context: Vec<IndexedTerm>,
    endpoints: BTreeMap<EndpointId, EndpointTerms>,
}

impl VocabularyIndex {
    pub fn build(config: &DomainConfiguration) -> Self {
        let vocabulary = &config.vocabulary;

        let mut normalizations: Vec<Normalization> = vocabulary
            .synonyms
            .iter()
            .filter_map(|(term, targets)| {
                let from = IndexedTerm::new(term)?;
                let to = targets
                    .iter()
                    .filter_map(|t| IndexedTerm::new(t))
                    .find(|t| t.phrase != from.phrase)?;
                Some(Normalization { from, to })
            })
            .collect();
        normalizations.sort_by(|a, b| {
            b.from
                .phrase
                .len()
                .cmp(&a.from.phrase.len())
                .then_with(|| a.from.term.cmp(&b.from.term))
        });

        let expansions = vocabulary
            .bidirectional_synonyms()
            .iter()
            .filter_map(|(term, related)| Some((IndexedTerm::new(term)?, index_terms(related))))
            .collect();

        let group = |map: &BTreeMap<String, BTreeSet<String>>| -> Vec<(String, Vec<IndexedTerm>)> {
            map.iter()
                .map(|(name, terms)| (name.clone(), index_terms(terms)))
                .filter(|(_, terms)| !terms.is_empty())
                .collect()
        };

        let endpoints = config
            .endpoint_mappings
            .iter()
            .map(|(id, spec)| {
                let avoid = config
                    .avoid_terms
                    .get(id)
                    .map(|terms| index_terms(terms))
                    .unwrap_or_default();
                (
                    id.clone(),
                    EndpointTerms {
                        boost: index_terms(&spec.boost_terms),
                        penalty: index_terms(&spec.penalty_terms),
                        avoid,
                    },
                )
            })
            .collect();

        Self {
            normalizations,
            expansions,
            entities: group(&vocabulary.entities),
            qualifiers: group(&vocabulary.qualifiers),
            primary: index_terms(&vocabulary.domain_terms.primary),
            secondary: index_terms(&vocabulary.domain_terms.secondary),
            context: index_terms(&vocabulary.domain_terms.context),
            endpoints,
        }
    }

    /// Rewrite domain terms to their generic equivalents
    fn normalize(&self, tokens: &[String]) -> (Vec<String>, Vec<(String, String)>) {
        let mut out = Vec::with_capacity(tokens.len());
        let mut applied = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let rest = &tokens[i..];
            match self
                .normalizations
                .iter()
                .find(|n| rest.starts_with(&n.from.phrase))
            {
                Some(n) => {
                    out.extend(n.to.phrase.iter().cloned());
                    applied.push((n.from.term.clone(), n.to.term.clone()));
                    i += n.from.phrase.len();
                }
                None => {
                    out.push(tokens[i].clone());
                    i += 1;
                }
            }
        }
        (out, applied)
    }

    /// Related terms of everything present, in both synonym directions
    fn expand(&self, tokens: &[String]) -> (Vec<String>, Vec<String>) {
        let mut added = BTreeSet::new();
        let mut extra = Vec::new();
        for (key, related) in &self.expansions {
            if !key.matches(tokens) {
                continue;
            }
            for term in related {
                if !term.matches(tokens) && added.insert(term.term.clone()) {
                    extra.extend(term.phrase.iter().cloned());
                }
            }
        }
        (extra, added.into_iter().collect())
    }
}

/// Query after domain adaptation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedQuery {
    pub original: String,
    /// Stemmed content tokens of the original query
    pub tokens: Vec<String>,
    /// Tokens after domain terms were rewritten to generic ones
    pub normalized_tokens: Vec<String>,
    /// Normalized tokens followed by synonym expansions
    pub expanded_tokens: Vec<String>,
    /// (domain term, generic term) rewrites applied
    pub normalized_terms: Vec<(String, String)>,
    pub expansions: Vec<String>,
    pub entities: BTreeMap<String, BTreeSet<String>>,
    pub qualifiers: BTreeMap<String, BTreeSet<String>>,
    pub matched_domain_terms: Vec<String>,
    pub domain_relevance: f64,
    /// Original ranking merged with the ranking of the expanded tokens
    pub intents: RankedIntents,
    pub reasoning: Vec<String>,
}

impl EnhancedQuery {
    /// History key of the query
    pub fn pattern(&self) -> QueryPattern {
        QueryPattern::from_terms(&self.tokens)
    }
}

/// Maps ranked intents onto the endpoints of the active domain
#[derive(Debug, Clone)]
pub struct VocabularyAdapter {
    settings: AdapterSettings,
    classifier: BaseIntentClassifier,
}

impl VocabularyAdapter {
    pub fn new(settings: AdapterSettings, classifier: BaseIntentClassifier) -> Self {
        Self {
            settings,
            classifier,
        }
    }

    pub fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    /// Normalize, expand and score the query against the domain vocabulary
    pub fn enhance(
        &self,
        query: &str,
        tokenized: &TokenizedQuery,
        ranked: &RankedIntents,
        index: &VocabularyIndex,
    ) -> EnhancedQuery {
        let mut reasoning = Vec::new();

        // 1. Normalize domain terms
        let (normalized, normalized_terms) = index.normalize(&tokenized.tokens);
        for (from, to) in &normalized_terms {
            reasoning.push(format!("Normalized '{}' to '{}'", from, to));
        }

        // 2. Expand synonyms
        let (extra, expansions) = index.expand(&normalized);
        if !expansions.is_empty() {
            reasoning.push(format!("Expanded synonyms: {}", expansions.join(", ")));
        }
        let mut expanded_tokens = normalized.clone();
        expanded_tokens.extend(extra);

        let views: [&[String]; 2] = [&tokenized.tokens, &expanded_tokens];

        // 3. Entities and qualifiers
        let collect = |groups: &[(String, Vec<IndexedTerm>)]| -> BTreeMap<String, BTreeSet<String>> {
            groups
                .iter()
                .filter_map(|(name, terms)| {
                    let found: BTreeSet<String> =
                        matched(terms, &views).into_iter().map(str::to_string).collect();
                    (!found.is_empty()).then(|| (name.clone(), found))
                })
                .collect()
        };
        let entities = collect(&index.entities);
        let qualifiers = collect(&index.qualifiers);
        for (category, terms) in &entities {
            reasoning.push(format!(
                "Entity {}: {}",
                category,
                terms.iter().cloned().collect::<Vec<_>>().join(", ")
            ));
        }

        // 4. Domain relevance
        let primary = matched(&index.primary, &views);
        let secondary = matched(&index.secondary, &views);
        let context = matched(&index.context, &views);
        let domain_relevance = (self.settings.relevance_floor
            + self.settings.primary_term_weight * primary.len() as f64
            + self.settings.secondary_term_weight * secondary.len() as f64
            + self.settings.context_term_weight * context.len() as f64)
            .clamp(0.0, 1.0);
        reasoning.push(format!(
            "Domain relevance {:.2} (primary: {}, secondary: {}, context: {})",
            domain_relevance,
            primary.len(),
            secondary.len(),
            context.len()
        ));
        let matched_domain_terms: Vec<String> = primary
            .iter()
            .chain(&secondary)
            .chain(&context)
            .map(|t| t.to_string())
            .collect();

        // Domain phrasing reaches the generic signatures through a second pass
        let intents = if expanded_tokens == tokenized.tokens {
            ranked.clone()
        } else {
            ranked.merge_max(&self.classifier.classify(&expanded_tokens))
        };

        tracing::debug!(
            relevance = domain_relevance,
            expansions = expansions.len(),
            normalized = normalized_terms.len(),
            "Adapted query to domain vocabulary"
        );

        EnhancedQuery {
            original: query.to_string(),
            tokens: tokenized.tokens.clone(),
            normalized_tokens: normalized,
            expanded_tokens,
            normalized_terms,
            expansions,
            entities,
            qualifiers,
            matched_domain_terms,
            domain_relevance,
            intents,
            reasoning,
        }
    }

    /// Endpoint candidates for an adapted query, best first
    pub fn candidates(
        &self,
        query: &EnhancedQuery,
        config: &DomainConfiguration,
        index: &VocabularyIndex,
    ) -> Result<Vec<EndpointCandidate>> {
        let top = query
            .intents
            .top_n(self.settings.top_n_intents, self.settings.min_intent_score);
        if top.is_empty() {
            return Ok(Vec::new());
        }

        let views: [&[String]; 2] = [&query.tokens, &query.expanded_tokens];
        let literal: [&[String]; 2] = [&query.tokens, &query.normalized_tokens];
        let mut candidates = Vec::new();

        for (id, spec) in &config.endpoint_mappings {
            let served: Vec<_> = top
                .iter()
                .filter(|s| spec.primary_intents.contains(&s.intent))
                .collect();
            let Some(best) = served.first() else {
                continue;
            };

            let others: f64 = served.iter().skip(1).map(|s| s.score).sum();
            let intent_score =
                (best.score + self.settings.secondary_intent_weight * others).min(1.0);
            let mut candidate = EndpointCandidate::new(
                id.clone(),
                intent_score * query.domain_relevance,
                served.iter().map(|s| s.intent).collect(),
            );

            let terms = index.endpoints.get(id).ok_or_else(|| {
                EngineError::from(geo_router_core::RouterError::InvariantViolation(format!(
                    "endpoint {} missing from vocabulary index",
                    id
                )))
            })?;

            let boosts = matched(&terms.boost, &views);
            if !boosts.is_empty() {
                let factor = (1.0 + self.settings.boost_step * boosts.len() as f64)
                    .min(self.settings.max_boost);
                tracing::debug!(endpoint = %id, factor, terms = ?boosts, "Applied boost terms");
                candidate.apply_domain_boost(
                    factor,
                    format!("Boost terms matched: {}", boosts.join(", ")),
                );
            }

            let penalties = matched(&terms.penalty, &views);
            if !penalties.is_empty() {
                let factor = (1.0 - self.settings.penalty_step * penalties.len() as f64)
                    .max(self.settings.min_penalty_factor);
                tracing::debug!(endpoint = %id, factor, terms = ?penalties, "Applied penalty terms");
                candidate.apply_domain_penalty(
                    PenaltyKind::PenaltyTerms,
                    1.0 - factor,
                    penalties.iter().map(|t| t.to_string()).collect(),
                    format!("Penalty terms matched: {}", penalties.join(", ")),
                );
            }

            // Avoidance looks at what the user wrote, not at expansions
            let avoided = matched(&terms.avoid, &literal);
            if !avoided.is_empty() {
                let fraction = avoided.len() as f64 / terms.avoid.len() as f64;
                let penalty = (fraction * self.settings.avoid_penalty_weight)
                    .min(self.settings.max_avoid_penalty);
                tracing::debug!(endpoint = %id, penalty, terms = ?avoided, "Applied avoid terms");
                candidate.apply_domain_penalty(
                    PenaltyKind::AvoidTerms,
                    penalty,
                    avoided.iter().map(|t| t.to_string()).collect(),
                    format!(
                        "Query mentions terms {} should avoid: {}",
                        id,
                        avoided.join(", ")
                    ),
                );
            }

            candidates.push(candidate);
        }

        sort_candidates(&mut candidates);
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_router_core::BaseIntent;
    use geo_router_text_processing::Tokenizer;

    const DOMAIN: &str = r#"
name: retail
vocabulary:
  entities:
    business: [store, outlet, competitor]
  qualifiers:
    ranking: [top, best]
  domain_terms:
    primary: [market, store, competitor]
    secondary: [area, brand]
    context: [score, region]
  synonyms:
    rival: [competitor]
    shop: [store]
endpoint_mappings:
  /competitive-analysis:
    primary_intents: [competitive_analysis, performance_ranking]
    boost_terms: [competitive, advantage]
  /performance-ranking:
    primary_intents: [performance_ranking]
    boost_terms: [top]
    penalty_terms: [demographic]
  /demographic-insights:
    primary_intents: [demographic_analysis]
avoid_terms:
  /demographic-insights: [competitor, competitive, rival]
"#;

    fn setup() -> (DomainConfiguration, VocabularyIndex, VocabularyAdapter) {
        let config = DomainConfiguration::from_yaml_str(DOMAIN).unwrap();
        let index = VocabularyIndex::build(&config);
        let adapter =
            VocabularyAdapter::new(AdapterSettings::default(), BaseIntentClassifier::new());
        (config, index, adapter)
    }

    fn adapt(query: &str) -> (EnhancedQuery, Vec<EndpointCandidate>) {
        let (config, index, adapter) = setup();
        let tokenized = Tokenizer::new().tokenize(query);
        let ranked = BaseIntentClassifier::new().classify(&tokenized.tokens);
        let enhanced = adapter.enhance(query, &tokenized, &ranked, &index);
        let candidates = adapter.candidates(&enhanced, &config, &index).unwrap();
        (enhanced, candidates)
    }

    #[test]
    fn test_relevance_weights() {
        let (enhanced, _) = adapt("Show me the top 10 areas by competitive advantage score");
        // floor 0.5 + area 0.2 + score 0.1
        assert!((enhanced.domain_relevance - 0.8).abs() < 1e-9);
        assert_eq!(enhanced.matched_domain_terms, vec!["area", "score"]);
    }

    #[test]
    fn test_candidate_scores() {
        let (_, candidates) = adapt("Show me the top 10 areas by competitive advantage score");
        let top = &candidates[0];
        assert_eq!(top.endpoint.as_str(), "/competitive-analysis");
        assert_eq!(
            top.matched_intents,
            vec![BaseIntent::CompetitiveAnalysis, BaseIntent::PerformanceRanking]
        );
        // (0.66 + 0.5 * 0.6) * 0.8
        assert!((top.base_score - 0.768).abs() < 1e-9);
        // two boost terms
        assert!((top.domain_score - 0.9216).abs() < 1e-9);

        let ranking = candidates
            .iter()
            .find(|c| c.endpoint.as_str() == "/performance-ranking")
            .unwrap();
        assert!((ranking.base_score - 0.48).abs() < 1e-9);
        assert!((ranking.domain_score - 0.528).abs() < 1e-9);
    }

    #[test]
    fn test_synonym_normalization_and_expansion() {
        let (enhanced, _) = adapt("Which rival shops lead the region");
        assert!(enhanced
            .normalized_terms
            .contains(&("rival".to_string(), "competitor".to_string())));
        assert!(enhanced.expanded_tokens.contains(&"competitor".to_string()));
        assert!(enhanced.entities["business"].contains("competitor"));
        assert!(enhanced.entities["business"].contains("store"));
        // competitor + store primary, region context
        assert!((enhanced.domain_relevance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_avoid_terms_penalize() {
        let (_, candidates) = adapt("customer population near competitor stores");
        let demo = candidates
            .iter()
            .find(|c| c.endpoint.as_str() == "/demographic-insights")
            .unwrap();
        let avoid = demo
            .penalties
            .iter()
            .find(|p| p.kind == PenaltyKind::AvoidTerms)
            .unwrap();
        assert_eq!(avoid.matched_terms, vec!["competitor"]);
        // one of three terms: 1/3 * 1.5 = 0.5
        assert!((avoid.penalty - 0.5).abs() < 1e-9);
        assert!(demo.domain_score < demo.base_score);
    }

    #[test]
    fn test_no_intent_no_candidates() {
        let (enhanced, candidates) = adapt("purple elephants sing");
        assert!(enhanced.intents.is_empty());
        assert!(candidates.is_empty());
    }
}
