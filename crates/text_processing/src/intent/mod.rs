//! Base Intent Classification
//!
//! Scores every base intent against the query tokens using the static
//! signature table. Domain-agnostic: the domain vocabulary adapter decides
//! which endpoints the ranked intents map onto.
//!
//! # Scoring
//!
//! Each category contributes `weight × matched_concepts / concept_count`
//! (subject 35%, analysis 25%, scope 20%, quality 20%). When at least two
//! categories contribute the sum is multiplied by 1.2, capped at 1.0.
//!
//! # Example
//!
//! ```
//! use geo_router_text_processing::intent::BaseIntentClassifier;
//! use geo_router_text_processing::Tokenizer;
//! use geo_router_core::BaseIntent;
//!
//! let classifier = BaseIntentClassifier::new();
//! let query = Tokenizer::new().tokenize("Show population and income by neighborhood");
//! let ranked = classifier.classify(&query.tokens);
//!
//! assert_eq!(ranked.top().map(|s| s.intent), Some(BaseIntent::DemographicAnalysis));
//! ```

mod signatures;

pub use signatures::{signature, signatures, Concept, IntentSignature};

use geo_router_core::{CategoryMatch, IntentScore, RankedIntents};

use crate::tokenizer::{contains_sequence, Tokenizer};
use crate::{Result, TextProcessingError};
use signatures::COMPILED;

/// Default multiplier when several categories contribute
pub const MULTI_CATEGORY_BONUS: f64 = 1.2;

/// Base intent classifier
#[derive(Debug, Clone)]
pub struct BaseIntentClassifier {
    multi_category_bonus: f64,
    min_bonus_categories: usize,
}

impl Default for BaseIntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseIntentClassifier {
    pub fn new() -> Self {
        Self {
            multi_category_bonus: MULTI_CATEGORY_BONUS,
            min_bonus_categories: 2,
        }
    }

    /// Override the multi-category bonus (must be in `[1.0, 2.0]`)
    pub fn with_bonus(mut self, bonus: f64) -> Result<Self> {
        if !(1.0..=2.0).contains(&bonus) {
            return Err(TextProcessingError::InvalidSettings(format!(
                "multi-category bonus must be between 1.0 and 2.0, got {}",
                bonus
            )));
        }
        self.multi_category_bonus = bonus;
        Ok(self)
    }

    /// Rank all base intents for stemmed content tokens
    ///
    /// An empty token list yields all-zero scores, so `top()` is `None`.
    pub fn classify(&self, tokens: &[String]) -> RankedIntents {
        let scores = COMPILED
            .iter()
            .map(|sig| {
                if tokens.is_empty() {
                    return IntentScore::zero(sig.intent);
                }

                let breakdown: Vec<CategoryMatch> = sig
                    .categories
                    .iter()
                    .map(|(category, concepts)| {
                        let matched_terms: Vec<String> = concepts
                            .iter()
                            .filter(|concept| {
                                concept.phrases.iter().any(|p| contains_sequence(tokens, p))
                            })
                            .map(|concept| concept.name.to_string())
                            .collect();
                        let term_count = concepts.len();
                        let contribution = if matched_terms.is_empty() || term_count == 0 {
                            0.0
                        } else {
                            category.weight() * matched_terms.len() as f64 / term_count as f64
                        };
                        CategoryMatch {
                            category: *category,
                            matched_terms,
                            term_count,
                            contribution,
                        }
                    })
                    .collect();

                let sum: f64 = breakdown.iter().map(|c| c.contribution).sum();
                let contributing = breakdown.iter().filter(|c| c.contribution > 0.0).count();
                let bonus = contributing >= self.min_bonus_categories;
                let score = if bonus {
                    (sum * self.multi_category_bonus).min(1.0)
                } else {
                    sum.min(1.0)
                };

                IntentScore {
                    intent: sig.intent,
                    score,
                    multi_category_bonus: bonus,
                    breakdown,
                }
            })
            .collect();

        let ranked = RankedIntents::from_scores(scores);
        if let Some(top) = ranked.top() {
            tracing::debug!(intent = %top.intent, score = top.score, "Classified base intent");
        }
        ranked
    }

    /// Tokenize and classify raw text
    pub fn classify_text(&self, text: &str) -> RankedIntents {
        let query = Tokenizer::new().tokenize(text);
        self.classify(&query.tokens)
    }
}
