//! Routing history
//!
//! The only dataset-side state mutated after startup. Outcomes are recorded
//! per query pattern once feedback arrives; routing itself only reads.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::ids::EndpointId;

/// Normalized query shape: sorted, de-duplicated content terms
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryPattern(Vec<String>);

impl QueryPattern {
    /// Build from content terms (already stemmed/normalized by the caller)
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self(set.into_iter().collect())
    }

    pub fn terms(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Jaccard similarity of the two term sets
    pub fn similarity(&self, other: &QueryPattern) -> f64 {
        if self.0.is_empty() && other.0.is_empty() {
            return 1.0;
        }
        let a: BTreeSet<&String> = self.0.iter().collect();
        let b: BTreeSet<&String> = other.0.iter().collect();
        let intersection = a.intersection(&b).count();
        let union = a.union(&b).count();
        if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        }
    }
}

impl fmt::Display for QueryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(" "))
    }
}

/// Success/failure counts for one endpoint under one pattern
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub successes: u32,
    pub failures: u32,
}

impl OutcomeCounts {
    pub fn total(&self) -> u32 {
        self.successes.saturating_add(self.failures)
    }

    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.successes as f64 / self.total() as f64
        }
    }
}

/// Outcomes recorded for one query pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub outcomes: BTreeMap<EndpointId, OutcomeCounts>,
    pub last_updated: DateTime<Utc>,
}

impl HistoryEntry {
    fn new() -> Self {
        Self {
            outcomes: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

/// Best historical evidence for an endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryMatch {
    pub pattern: QueryPattern,
    pub similarity: f64,
    pub success_rate: f64,
    pub observations: u32,
}

impl HistoryMatch {
    /// How strongly the past outcome vouches for the endpoint
    pub fn confidence(&self) -> f64 {
        self.similarity * self.success_rate
    }
}

/// Concurrent pattern → outcome store
#[derive(Debug)]
pub struct RoutingHistory {
    entries: DashMap<QueryPattern, HistoryEntry>,
    max_patterns: usize,
}

impl Default for RoutingHistory {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl RoutingHistory {
    /// Create a store holding at most `max_patterns` patterns
    pub fn new(max_patterns: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_patterns: max_patterns.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record one routing outcome
    pub fn record(&self, pattern: QueryPattern, endpoint: EndpointId, success: bool) {
        if pattern.is_empty() {
            return;
        }

        if !self.entries.contains_key(&pattern) && self.entries.len() >= self.max_patterns {
            self.evict_oldest();
        }

        let mut entry = self.entries.entry(pattern).or_insert_with(HistoryEntry::new);
        let counts = entry.outcomes.entry(endpoint).or_default();
        if success {
            counts.successes = counts.successes.saturating_add(1);
        } else {
            counts.failures = counts.failures.saturating_add(1);
        }
        entry.last_updated = Utc::now();
    }

    /// Outcome counts for an exact pattern/endpoint pair
    pub fn outcome(&self, pattern: &QueryPattern, endpoint: &EndpointId) -> Option<OutcomeCounts> {
        self.entries
            .get(pattern)
            .and_then(|entry| entry.outcomes.get(endpoint).copied())
    }

    /// Most similar past pattern with at least one success for `endpoint`
    ///
    /// Ties are broken by pattern order so the result does not depend on
    /// map iteration order.
    pub fn best_match(
        &self,
        pattern: &QueryPattern,
        endpoint: &EndpointId,
        min_similarity: f64,
    ) -> Option<HistoryMatch> {
        let mut best: Option<HistoryMatch> = None;

        for item in self.entries.iter() {
            let Some(counts) = item.value().outcomes.get(endpoint) else {
                continue;
            };
            if counts.successes == 0 {
                continue;
            }
            let similarity = pattern.similarity(item.key());
            if similarity < min_similarity {
                continue;
            }
            let candidate = HistoryMatch {
                pattern: item.key().clone(),
                similarity,
                success_rate: counts.success_rate(),
                observations: counts.total(),
            };
            let better = match &best {
                None => true,
                Some(current) => {
                    let (c, b) = (candidate.confidence(), current.confidence());
                    c > b || (c == b && candidate.pattern < current.pattern)
                }
            };
            if better {
                best = Some(candidate);
            }
        }

        best
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by(|a, b| {
                a.value()
                    .last_updated
                    .cmp(&b.value().last_updated)
                    .then_with(|| a.key().cmp(b.key()))
            })
            .map(|item| item.key().clone());

        if let Some(key) = oldest {
            tracing::debug!(pattern = %key, "Evicting oldest routing history pattern");
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(id: &str) -> EndpointId {
        EndpointId::parse(id).unwrap()
    }

    #[test]
    fn test_pattern_normalization() {
        let a = QueryPattern::from_terms(["Score", "area", "score", " competitive "]);
        assert_eq!(a.terms(), &["area", "competitive", "score"]);
    }

    #[test]
    fn test_similarity() {
        let a = QueryPattern::from_terms(["a", "b", "c", "d"]);
        let b = QueryPattern::from_terms(["a", "b", "c", "e"]);
        assert!((a.similarity(&b) - 0.6).abs() < 1e-9);
        assert_eq!(a.similarity(&a), 1.0);
    }

    #[test]
    fn test_record_and_match() {
        let history = RoutingHistory::default();
        let pattern = QueryPattern::from_terms(["top", "area", "competitive"]);
        let ep = endpoint("/competitive-analysis");

        history.record(pattern.clone(), ep.clone(), true);
        history.record(pattern.clone(), ep.clone(), false);

        let counts = history.outcome(&pattern, &ep).unwrap();
        assert_eq!(counts.total(), 2);
        assert_eq!(counts.success_rate(), 0.5);

        let m = history.best_match(&pattern, &ep, 0.8).unwrap();
        assert_eq!(m.similarity, 1.0);
        assert_eq!(m.confidence(), 0.5);

        assert!(history.best_match(&pattern, &endpoint("/other"), 0.8).is_none());
    }

    #[test]
    fn test_counts_saturate() {
        let history = RoutingHistory::default();
        let pattern = QueryPattern::from_terms(["x"]);
        let ep = endpoint("/x");
        history.record(pattern.clone(), ep.clone(), true);
        if let Some(mut entry) = history.entries.get_mut(&pattern) {
            if let Some(counts) = entry.outcomes.get_mut(&ep) {
                counts.successes = u32::MAX;
                counts.failures = u32::MAX;
            }
        }

        history.record(pattern.clone(), ep.clone(), true);
        history.record(pattern.clone(), ep.clone(), false);
        let counts = history.outcome(&pattern, &ep).unwrap();
        assert_eq!(counts.successes, u32::MAX);
        assert_eq!(counts.failures, u32::MAX);
        assert_eq!(counts.total(), u32::MAX);
    }

    #[test]
    fn test_failures_only_do_not_match() {
        let history = RoutingHistory::default();
        let pattern = QueryPattern::from_terms(["x", "y"]);
        let ep = endpoint("/x");
        history.record(pattern.clone(), ep.clone(), false);
        assert!(history.best_match(&pattern, &ep, 0.0).is_none());
    }

    #[test]
    fn test_capacity_eviction() {
        let history = RoutingHistory::new(2);
        let ep = endpoint("/x");
        history.record(QueryPattern::from_terms(["a"]), ep.clone(), true);
        history.record(QueryPattern::from_terms(["b"]), ep.clone(), true);
        history.record(QueryPattern::from_terms(["c"]), ep, true);
        assert_eq!(history.len(), 2);
    }
}
