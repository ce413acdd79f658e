//! Endpoint candidates and their score adjustments
//!
//! A candidate's score moves through three stages:
//! `base_score` (intent × domain relevance), `domain_score` (after boost,
//! penalty and avoid terms) and `contextual_score` (after dataset context).
//! Every adjustment is recorded so the reasoning trace can replay it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::EndpointId;
use crate::intent::BaseIntent;

/// Source of a score enhancement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementKind {
    BoostTerms,
    FieldAvailability,
    HistoricalMatch,
    DataQuality,
}

impl fmt::Display for EnhancementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BoostTerms => "boost_terms",
            Self::FieldAvailability => "field_availability",
            Self::HistoricalMatch => "historical_match",
            Self::DataQuality => "data_quality",
        };
        f.write_str(s)
    }
}

/// A multiplicative score adjustment with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enhancement {
    pub kind: EnhancementKind,
    /// Factor the score was multiplied by
    pub impact: f64,
    pub reasoning: String,
}

/// Source of a score penalty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyKind {
    PenaltyTerms,
    AvoidTerms,
}

/// A score reduction with the terms that triggered it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub kind: PenaltyKind,
    /// Fraction removed from the score (0.0 - 1.0)
    pub penalty: f64,
    pub matched_terms: Vec<String>,
    pub reasoning: String,
}

/// An endpoint under consideration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointCandidate {
    pub endpoint: EndpointId,
    pub base_score: f64,
    pub domain_score: f64,
    pub contextual_score: f64,
    pub final_confidence: f64,
    pub matched_intents: Vec<BaseIntent>,
    pub enhancements: Vec<Enhancement>,
    pub penalties: Vec<Penalty>,
}

impl EndpointCandidate {
    /// New candidate; all later scores start at `base_score`
    pub fn new(endpoint: EndpointId, base_score: f64, matched_intents: Vec<BaseIntent>) -> Self {
        let base_score = base_score.clamp(0.0, 1.0);
        Self {
            endpoint,
            base_score,
            domain_score: base_score,
            contextual_score: base_score,
            final_confidence: base_score,
            matched_intents,
            enhancements: Vec::new(),
            penalties: Vec::new(),
        }
    }

    /// Boost at the vocabulary stage
    pub fn apply_domain_boost(&mut self, factor: f64, reasoning: impl Into<String>) {
        self.domain_score *= factor;
        self.enhancements.push(Enhancement {
            kind: EnhancementKind::BoostTerms,
            impact: factor,
            reasoning: reasoning.into(),
        });
        self.sync_from_domain();
    }

    /// Penalty at the vocabulary stage: `score *= (1 - penalty)`
    pub fn apply_domain_penalty(
        &mut self,
        kind: PenaltyKind,
        penalty: f64,
        matched_terms: Vec<String>,
        reasoning: impl Into<String>,
    ) {
        let penalty = penalty.clamp(0.0, 1.0);
        self.domain_score *= 1.0 - penalty;
        self.penalties.push(Penalty {
            kind,
            penalty,
            matched_terms,
            reasoning: reasoning.into(),
        });
        self.sync_from_domain();
    }

    /// Multiplicative dataset-context adjustment
    pub fn apply_context_factor(
        &mut self,
        kind: EnhancementKind,
        factor: f64,
        reasoning: impl Into<String>,
    ) {
        let factor = if factor.is_finite() { factor.max(0.0) } else { 1.0 };
        self.contextual_score *= factor;
        self.final_confidence = self.contextual_score.clamp(0.0, 1.0);
        self.enhancements.push(Enhancement {
            kind,
            impact: factor,
            reasoning: reasoning.into(),
        });
    }

    /// Product of all context factors applied so far
    pub fn context_multiplier(&self) -> f64 {
        self.enhancements
            .iter()
            .filter(|e| e.kind != EnhancementKind::BoostTerms)
            .map(|e| e.impact)
            .product()
    }

    fn sync_from_domain(&mut self) {
        self.domain_score = self.domain_score.max(0.0);
        self.contextual_score = self.domain_score * self.context_multiplier();
        self.final_confidence = self.contextual_score.clamp(0.0, 1.0);
    }
}

/// Sort candidates by descending confidence, ties by endpoint id
pub fn sort_candidates(candidates: &mut [EndpointCandidate]) {
    candidates.sort_by(|a, b| {
        b.final_confidence
            .partial_cmp(&a.final_confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.endpoint.cmp(&b.endpoint))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, score: f64) -> EndpointCandidate {
        EndpointCandidate::new(
            EndpointId::parse(id).unwrap(),
            score,
            vec![BaseIntent::CompetitiveAnalysis],
        )
    }

    #[test]
    fn test_domain_adjustments() {
        let mut c = candidate("/competitive-analysis", 0.5);
        c.apply_domain_boost(1.2, "matched 'advantage'");
        assert!((c.domain_score - 0.6).abs() < 1e-9);
        c.apply_domain_penalty(PenaltyKind::AvoidTerms, 0.5, vec!["demographic".into()], "avoid");
        assert!((c.domain_score - 0.3).abs() < 1e-9);
        assert!((c.final_confidence - 0.3).abs() < 1e-9);
        assert_eq!(c.base_score, 0.5);
    }

    #[test]
    fn test_context_factor_clamps_final() {
        let mut c = candidate("/a", 0.9);
        c.apply_context_factor(EnhancementKind::HistoricalMatch, 1.3, "history");
        assert!(c.contextual_score > 1.0);
        assert_eq!(c.final_confidence, 1.0);
    }

    #[test]
    fn test_sort_ties_by_endpoint() {
        let mut list = vec![candidate("/b", 0.5), candidate("/a", 0.5), candidate("/c", 0.7)];
        sort_candidates(&mut list);
        let ids: Vec<&str> = list.iter().map(|c| c.endpoint.as_str()).collect();
        assert_eq!(ids, vec!["/c", "/a", "/b"]);
    }
}
