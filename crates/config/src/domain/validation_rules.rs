//! Compiled validator rules
//!
//! Every pattern is compiled once at load into a case-insensitive,
//! word-boundary regex that also accepts a simple plural suffix.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use super::document::{DomainIndicatorsDocument, ValidationRulesDocument};
use crate::ConfigError;

/// Redirects used when a document defines none of its own
static BUILTIN_REDIRECTS: Lazy<Vec<(&'static str, &'static [&'static str], &'static str)>> =
    Lazy::new(|| {
        vec![
            (
                "weather",
                &["weather", "forecast", "temperature", "rain"][..],
                "For weather information, please use a dedicated weather service. I can help analyze how locations compare on business and demographic measures.",
            ),
            (
                "technical_support",
                &["password", "login", "install", "error", "bug"][..],
                "For technical issues, please contact your system administrator or support team. I can help with questions about your market and location data.",
            ),
            (
                "personal_requests",
                &["recipe", "dating", "relationship", "vacation", "diet"][..],
                "I focus on business and location analytics and can't help with personal requests. Try asking about markets, competitors or customer demographics.",
            ),
            (
                "creative_tasks",
                &["poem", "story", "song", "joke"][..],
                "I can't write creative content, but I can analyze areas, competitors and demographics for you.",
            ),
        ]
    });

const GENERIC_REDIRECT: &str =
    "That question is outside what I can analyze. Try asking about market performance, competitors or demographics in specific areas.";

/// Compiled matcher over a list of terms or phrases
#[derive(Debug, Clone)]
pub struct TermMatcher {
    entries: Vec<(String, Regex)>,
}

impl TermMatcher {
    /// Compile terms; blanks are skipped and duplicates collapsed
    pub fn compile<I, S>(terms: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        let mut entries = Vec::with_capacity(unique.len());
        for term in unique {
            let body = term
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+");
            let pattern = format!(r"(?i)\b{}(?:s|es)?\b", body);
            let regex = Regex::new(&pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: term.clone(),
                message: e.to_string(),
            })?;
            entries.push((term, regex));
        }
        Ok(Self { entries })
    }

    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Terms found in `text`, in sorted term order
    pub fn matches<'a>(&'a self, text: &str) -> Vec<&'a str> {
        self.entries
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(term, _)| term.as_str())
            .collect()
    }

    pub fn count(&self, text: &str) -> usize {
        self.entries.iter().filter(|(_, re)| re.is_match(text)).count()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(term, _)| term.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Individual lower-cased words appearing in any term
    pub fn words(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .flat_map(|(term, _)| term.split_whitespace().map(str::to_string))
            .collect()
    }
}

/// Rejection patterns of one topic
#[derive(Debug, Clone)]
pub struct CompiledRejectionPattern {
    pub topic: String,
    pub matcher: TermMatcher,
}

/// Compiled domain indicators
#[derive(Debug, Clone)]
pub struct DomainIndicators {
    pub subjects: TermMatcher,
    pub actions: TermMatcher,
    pub contexts: TermMatcher,
}

impl DomainIndicators {
    fn compile(doc: &DomainIndicatorsDocument) -> Result<Self, ConfigError> {
        Ok(Self {
            subjects: TermMatcher::compile(&doc.required_subjects)?,
            actions: TermMatcher::compile(&doc.required_actions)?,
            contexts: TermMatcher::compile(&doc.valid_contexts)?,
        })
    }
}

/// Keyword-triggered redirect message
#[derive(Debug, Clone)]
pub struct TopicRedirect {
    pub topic: String,
    pub keywords: TermMatcher,
    pub message: String,
}

/// Everything the query validator needs
#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub rejection_patterns: Vec<CompiledRejectionPattern>,
    pub domain_indicators: DomainIndicators,
    pub topic_redirects: Vec<TopicRedirect>,
    pub generic_redirect: String,
    pub min_token_count: usize,
    /// Words of all rejection patterns, for coverage scoring
    rejection_vocabulary: BTreeSet<String>,
}

impl ValidationRules {
    pub fn compile(doc: &ValidationRulesDocument) -> Result<Self, ConfigError> {
        let mut rejection_patterns = Vec::with_capacity(doc.rejection_patterns.len());
        for (topic, patterns) in &doc.rejection_patterns {
            rejection_patterns.push(CompiledRejectionPattern {
                topic: topic.trim().to_lowercase(),
                matcher: TermMatcher::compile(patterns)?,
            });
        }

        let mut topic_redirects = Vec::new();
        if doc.topic_redirects.is_empty() {
            for (topic, keywords, message) in BUILTIN_REDIRECTS.iter() {
                topic_redirects.push(TopicRedirect {
                    topic: topic.to_string(),
                    keywords: TermMatcher::compile(keywords.iter())?,
                    message: message.to_string(),
                });
            }
        } else {
            for (topic, redirect) in &doc.topic_redirects {
                topic_redirects.push(TopicRedirect {
                    topic: topic.trim().to_lowercase(),
                    keywords: TermMatcher::compile(&redirect.keywords)?,
                    message: redirect.message.clone(),
                });
            }
        }

        let rejection_vocabulary = rejection_patterns
            .iter()
            .flat_map(|p| p.matcher.words())
            .collect();

        let generic_redirect = doc
            .generic_redirect
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(GENERIC_REDIRECT)
            .to_string();

        Ok(Self {
            rejection_patterns,
            domain_indicators: DomainIndicators::compile(&doc.domain_indicators)?,
            topic_redirects,
            generic_redirect,
            min_token_count: doc.min_token_count.max(1),
            rejection_vocabulary,
        })
    }

    /// Whether a lower-cased word belongs to any rejection pattern
    pub fn is_rejection_word(&self, word: &str) -> bool {
        self.rejection_vocabulary.contains(word)
            || word
                .strip_suffix("es")
                .or_else(|| word.strip_suffix('s'))
                .map(|stem| self.rejection_vocabulary.contains(stem))
                .unwrap_or(false)
    }

    /// Rejection hits per topic, topics without hits omitted
    pub fn rejection_hits<'a>(&'a self, text: &str) -> BTreeMap<&'a str, Vec<&'a str>> {
        self.rejection_patterns
            .iter()
            .filter_map(|p| {
                let hits = p.matcher.matches(text);
                if hits.is_empty() {
                    None
                } else {
                    Some((p.topic.as_str(), hits))
                }
            })
            .collect()
    }

    /// First redirect whose keywords appear in `text`
    pub fn redirect_for_text(&self, text: &str) -> Option<&TopicRedirect> {
        self.topic_redirects
            .iter()
            .find(|r| r.keywords.count(text) > 0)
    }

    /// First redirect whose keywords cover one of the matched rejection terms
    pub fn redirect_for_terms(&self, terms: &[&str]) -> Option<&TopicRedirect> {
        self.topic_redirects
            .iter()
            .find(|r| terms.iter().any(|term| r.keywords.count(term) > 0))
    }

    /// Redirect registered under a topic name
    pub fn redirect_for_topic(&self, topic: &str) -> Option<&TopicRedirect> {
        self.topic_redirects.iter().find(|r| r.topic == topic)
    }
}
