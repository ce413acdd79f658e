//! Query scope validation
//!
//! Decides whether a query belongs to the active domain at all. Runs before
//! and independently of intent classification: it only sees the query text
//! and the domain's validation rules, never endpoint candidates.

use std::collections::BTreeMap;

use geo_router_config::{DomainConfiguration, ValidationRules, ValidatorSettings};
use geo_router_core::{QueryScope, ValidationResult};

use crate::tokenizer::{is_stopword, Tokenizer};
use crate::{Result, TextProcessingError};

/// Confidence attached to relevance-based rejections
const RELEVANCE_REJECTION_CONFIDENCE: f64 = 0.6;

/// Scope validator
#[derive(Debug, Clone)]
pub struct QueryValidator {
    settings: ValidatorSettings,
    tokenizer: Tokenizer,
}

impl Default for QueryValidator {
    fn default() -> Self {
        Self {
            settings: ValidatorSettings::default(),
            tokenizer: Tokenizer::new(),
        }
    }
}

impl QueryValidator {
    pub fn new(settings: ValidatorSettings) -> Result<Self> {
        if settings.reject_relevance > settings.borderline_relevance {
            return Err(TextProcessingError::InvalidSettings(
                "reject_relevance must not exceed borderline_relevance".to_string(),
            ));
        }
        Ok(Self {
            settings,
            tokenizer: Tokenizer::new(),
        })
    }

    /// Classify the scope of a query under a domain configuration
    pub fn validate(&self, query: &str, config: &DomainConfiguration) -> ValidationResult {
        let rules = &config.validation_rules;

        if query.trim().is_empty() {
            return ValidationResult::malformed("Query is empty");
        }

        let tokenized = self.tokenizer.tokenize(query);
        if tokenized.word_count() == 0 {
            return ValidationResult::malformed("Query contains no words");
        }
        if tokenized.word_count() < rules.min_token_count {
            return ValidationResult::malformed(format!(
                "Query has {} word(s); at least {} are needed",
                tokenized.word_count(),
                rules.min_token_count
            ));
        }

        let text = query.to_lowercase();
        let relevance = domain_relevance(rules, &text);

        // 1. Rejection patterns
        let hits = rules.rejection_hits(&text);
        let hit_count: usize = hits.values().map(|h| h.len()).sum();
        let density = (hit_count as f64 * self.settings.pattern_hit_weight).min(1.0);

        let content: Vec<&String> = tokenized
            .words
            .iter()
            .filter(|w| !is_stopword(w))
            .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
            .collect();
        let coverage = if content.is_empty() {
            0.0
        } else {
            content.iter().filter(|w| rules.is_rejection_word(w)).count() as f64
                / content.len() as f64
        };

        let out_of_scope =
            density.max(coverage) * (1.0 - self.settings.relevance_dampening * relevance);

        tracing::debug!(
            relevance,
            out_of_scope,
            rejection_hits = hit_count,
            "Validated query scope"
        );

        if hit_count > 0 && out_of_scope >= self.settings.out_of_scope_threshold {
            let (topic, redirect) = resolve_redirect(rules, &hits);
            let listed: Vec<String> = hits
                .iter()
                .map(|(topic, terms)| format!("{} ({})", topic, terms.join(", ")))
                .collect();
            return ValidationResult::new(QueryScope::OutOfScope, out_of_scope, relevance)
                .with_reason(format!("Matched rejection patterns: {}", listed.join("; ")))
                .with_reason(format!(
                    "Out-of-scope score {:.2} at domain relevance {:.2}",
                    out_of_scope, relevance
                ))
                .with_topic(topic)
                .with_redirect(redirect)
                .with_suggestions(suggestions(rules));
        }

        // 2. Domain relevance
        if relevance < self.settings.reject_relevance {
            let mut result =
                ValidationResult::new(QueryScope::OutOfScope, RELEVANCE_REJECTION_CONFIDENCE, relevance)
                    .with_reason(format!(
                        "Domain relevance {:.2} is below {:.2}",
                        relevance, self.settings.reject_relevance
                    ))
                    .with_suggestions(suggestions(rules));
            result = if !hits.is_empty() {
                let (topic, redirect) = resolve_redirect(rules, &hits);
                result.with_topic(topic).with_redirect(redirect)
            } else {
                match rules.redirect_for_text(&text) {
                    Some(redirect) => result
                        .with_topic(redirect.topic.clone())
                        .with_redirect(redirect.message.clone()),
                    None => result.with_redirect(rules.generic_redirect.clone()),
                }
            };
            return result;
        }

        if relevance < self.settings.borderline_relevance {
            return ValidationResult::new(QueryScope::Borderline, 0.5, relevance)
                .with_reason(format!(
                    "Domain relevance {:.2} is below {:.2}",
                    relevance, self.settings.borderline_relevance
                ))
                .with_suggestions(suggestions(rules));
        }

        ValidationResult::in_scope((0.5 + relevance * 0.5).min(1.0), relevance)
            .with_reason(format!("Domain relevance {:.2}", relevance))
    }
}

/// Weighted subject/action/context indicator overlap in `[0, 1]`
pub fn domain_relevance(rules: &ValidationRules, text: &str) -> f64 {
    let indicators = &rules.domain_indicators;
    let part = |count: usize| (count as f64 / 2.0).min(1.0);
    let relevance = 0.5 * part(indicators.subjects.count(text))
        + 0.3 * part(indicators.actions.count(text))
        + 0.2 * part(indicators.contexts.count(text));
    relevance.clamp(0.0, 1.0)
}

/// Topic and redirect for a rejection, decided by the patterns that matched
///
/// A configured redirect is used only when its keywords cover a matched
/// term. Otherwise the topic with the most hits names the rejection.
fn resolve_redirect(
    rules: &ValidationRules,
    hits: &BTreeMap<&str, Vec<&str>>,
) -> (String, String) {
    let matched: Vec<&str> = hits.values().flatten().copied().collect();
    if let Some(redirect) = rules.redirect_for_terms(&matched) {
        return (redirect.topic.clone(), redirect.message.clone());
    }

    // Topic with the most hits; BTreeMap order breaks ties
    let topic = hits
        .iter()
        .fold(None::<(&str, usize)>, |best, (topic, terms)| match best {
            Some((_, n)) if n >= terms.len() => best,
            _ => Some((*topic, terms.len())),
        })
        .map(|(topic, _)| topic.to_string())
        .unwrap_or_else(|| "general".to_string());

    let message = rules
        .redirect_for_topic(&topic)
        .map(|r| r.message.clone())
        .unwrap_or_else(|| rules.generic_redirect.clone());
    (topic, message)
}

/// Rephrasing hints built from the domain indicators
fn suggestions(rules: &ValidationRules) -> Vec<String> {
    let indicators = &rules.domain_indicators;
    let subjects: Vec<&str> = indicators.subjects.terms().take(3).collect();
    let action = indicators.actions.terms().next();

    let mut out = Vec::new();
    if !subjects.is_empty() {
        out.push(format!(
            "Mention what you want to analyze, such as {}",
            subjects.join(", ")
        ));
    }
    match (action, subjects.first()) {
        (Some(action), Some(subject)) => out.push(format!(
            "Say what to do with it, e.g. \"{} {} in a specific area\"",
            action, subject
        )),
        _ => out.push("Name a place and a measure, e.g. \"median income by neighborhood\"".into()),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = r#"
name: retail
endpoint_mappings:
  /demographic-insights:
    primary_intents: [demographic_analysis]
validation_rules:
  rejection_patterns:
    general_knowledge: [weather, forecast, celebrity]
    technical_support: [password, login]
  domain_indicators:
    required_subjects: [market, store, area, customer, competitor]
    required_actions: [analyze, show, compare]
    valid_contexts: [region, score]
"#;

    fn config() -> DomainConfiguration {
        DomainConfiguration::from_yaml_str(DOMAIN).unwrap()
    }

    #[test]
    fn test_malformed_inputs() {
        let v = QueryValidator::default();
        let c = config();
        assert_eq!(v.validate("", &c).scope, QueryScope::Malformed);
        assert_eq!(v.validate("   ", &c).scope, QueryScope::Malformed);
        assert_eq!(v.validate("?!?...", &c).scope, QueryScope::Malformed);
        assert_eq!(v.validate("market", &c).scope, QueryScope::Malformed);
    }

    #[test]
    fn test_weather_is_rejected_with_redirect() {
        let result = QueryValidator::default()
            .validate("What's the weather forecast for tomorrow?", &config());
        assert_eq!(result.scope, QueryScope::OutOfScope);
        assert!(result.confidence >= 0.8);
        assert_eq!(result.topic.as_deref(), Some("weather"));
        assert!(result.redirect_message.unwrap().to_lowercase().contains("weather"));
    }

    #[test]
    fn test_topic_follows_matched_patterns() {
        let doc = DOMAIN.replace(
            "    technical_support: [password, login]\n",
            "    technical_support: [password, login]\n    creative_tasks: [poem, song, joke, story]\n",
        );
        let config = DomainConfiguration::from_yaml_str(&doc).unwrap();

        // "rain" is a weather keyword but no weather pattern matched
        let result = QueryValidator::default().validate("write a poem and a song about rain", &config);
        assert_eq!(result.scope, QueryScope::OutOfScope);
        assert_eq!(result.topic.as_deref(), Some("creative_tasks"));
        assert!(!result.redirect_message.unwrap().to_lowercase().contains("weather"));
    }

    #[test]
    fn test_in_scope() {
        let result =
            QueryValidator::default().validate("Show the top areas by competitor score", &config());
        assert_eq!(result.scope, QueryScope::InScope);
        assert!(result.domain_relevance >= 0.3);
        assert!(result.redirect_message.is_none());
    }

    #[test]
    fn test_borderline_has_suggestions() {
        // one subject only: 0.5 * 0.5 = 0.25
        let result = QueryValidator::default().validate("tell me about customer", &config());
        assert_eq!(result.scope, QueryScope::Borderline);
        assert!(!result.suggestions.is_empty());
    }

    #[test]
    fn test_irrelevant_is_soft_rejection() {
        let result = QueryValidator::default().validate("purple elephants sing loudly", &config());
        assert_eq!(result.scope, QueryScope::OutOfScope);
        assert!(result.confidence < 0.8);
        assert!(result.redirect_message.is_some());
    }

    #[test]
    fn test_relevance_dampens_rejection() {
        // one pattern hit next to strong domain language stays in scope
        let result = QueryValidator::default()
            .validate("analyze store sales forecast by region and market", &config());
        assert_ne!(result.scope, QueryScope::OutOfScope);
    }

    #[test]
    fn test_settings_validation() {
        let settings = ValidatorSettings {
            reject_relevance: 0.5,
            borderline_relevance: 0.3,
            ..Default::default()
        };
        assert!(QueryValidator::new(settings).is_err());
    }
}
