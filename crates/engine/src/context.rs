//! Dataset context enhancement
//!
//! Re-scores candidates against what the loaded dataset can actually answer.
//! Three multiplicative factors are computed independently per candidate:
//!
//! | Factor | Range | Source |
//! |--------|-------|--------|
//! | Field availability | `[availability_floor, 1]` | required fields present with enough coverage |
//! | Historical match | `[1, 1 + max_history_boost]` | similar past queries routed here with a success rate above `history_min_success_rate` |
//! | Data quality | `[quality_base, 1]` | mean relevance of required fields, missing count as 0 |
//!
//! Because every factor only reads the candidate's endpoint and the snapshot,
//! the order in which they are applied does not change the result.

use geo_router_config::{ContextSettings, DomainConfiguration};
use geo_router_core::{
    sort_candidates, DatasetContext, EndpointCandidate, EnhancementKind, QueryPattern,
    RouterError,
};

use crate::Result;

/// One computed adjustment, not yet applied
#[derive(Debug, Clone, PartialEq)]
pub struct ContextAdjustment {
    pub kind: EnhancementKind,
    pub factor: f64,
    pub reasoning: String,
}

/// Dataset-aware candidate re-scoring
#[derive(Debug, Clone)]
pub struct ContextEnhancer {
    settings: ContextSettings,
}

impl Default for ContextEnhancer {
    fn default() -> Self {
        Self::new(ContextSettings::default())
    }
}

impl ContextEnhancer {
    pub fn new(settings: ContextSettings) -> Self {
        Self { settings }
    }

    /// Share of the success rate above the boost level, in `[0, 1]`
    ///
    /// A pattern whose feedback is poor enough to tighten thresholds earns
    /// no boost.
    fn success_margin(&self, success_rate: f64) -> f64 {
        let min = self.settings.history_min_success_rate;
        if min >= 1.0 {
            return if success_rate >= 1.0 { 1.0 } else { 0.0 };
        }
        ((success_rate - min) / (1.0 - min)).clamp(0.0, 1.0)
    }

    /// Apply every context factor to every candidate and re-sort
    ///
    /// The candidate set is unchanged; only scores move.
    pub fn enhance(
        &self,
        mut candidates: Vec<EndpointCandidate>,
        pattern: &QueryPattern,
        dataset: &DatasetContext,
        config: &DomainConfiguration,
    ) -> Result<Vec<EndpointCandidate>> {
        for candidate in candidates.iter_mut() {
            for adjustment in self.adjustments(candidate, pattern, dataset, config)? {
                candidate.apply_context_factor(
                    adjustment.kind,
                    adjustment.factor,
                    adjustment.reasoning,
                );
            }
            tracing::debug!(
                endpoint = %candidate.endpoint,
                multiplier = candidate.context_multiplier(),
                confidence = candidate.final_confidence,
                "Applied dataset context"
            );
        }
        sort_candidates(&mut candidates);
        Ok(candidates)
    }

    /// Factors for one candidate
    ///
    /// Fails when the candidate names an endpoint the configuration does not
    /// define; that can only happen through a programming error upstream.
    pub fn adjustments(
        &self,
        candidate: &EndpointCandidate,
        pattern: &QueryPattern,
        dataset: &DatasetContext,
        config: &DomainConfiguration,
    ) -> Result<Vec<ContextAdjustment>> {
        let spec = config.endpoint(&candidate.endpoint).ok_or_else(|| {
            RouterError::InvariantViolation(format!(
                "candidate endpoint {} is not defined in domain '{}'",
                candidate.endpoint, config.name
            ))
        })?;

        let mut out = Vec::with_capacity(3);

        // (a) Field availability
        let required = spec.required_fields.len();
        if required > 0 {
            let usable: Vec<&str> = spec
                .required_fields
                .iter()
                .filter(|f| dataset.is_available(f))
                .filter(|f| {
                    dataset
                        .characteristics(f)
                        .map(|c| c.coverage >= self.settings.coverage_floor)
                        .unwrap_or(false)
                })
                .map(|f| f.as_str())
                .collect();
            let ratio = usable.len() as f64 / required as f64;
            let floor = self.settings.availability_floor;
            let factor = floor + (1.0 - floor) * ratio;
            out.push(ContextAdjustment {
                kind: EnhancementKind::FieldAvailability,
                factor,
                reasoning: format!(
                    "{} of {} required fields usable{}",
                    usable.len(),
                    required,
                    if usable.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", usable.join(", "))
                    }
                ),
            });
        }

        // (b) Historical pattern match
        if let Some(m) = dataset.routing_history.best_match(
            pattern,
            &candidate.endpoint,
            self.settings.history_similarity,
        ) {
            let boost = (m.similarity
                * self.success_margin(m.success_rate)
                * self.settings.history_weight)
                .min(self.settings.max_history_boost);
            if boost > 0.0 {
                out.push(ContextAdjustment {
                    kind: EnhancementKind::HistoricalMatch,
                    factor: 1.0 + boost,
                    reasoning: format!(
                        "Similar query {} succeeded here {:.0}% of {} time(s)",
                        m.pattern,
                        m.success_rate * 100.0,
                        m.observations
                    ),
                });
            }
        }

        // (c) Data quality
        if required > 0 {
            let total: f64 = spec
                .required_fields
                .iter()
                .map(|f| {
                    if dataset.is_available(f) {
                        dataset
                            .characteristics(f)
                            .map(|c| c.relevance_score)
                            .unwrap_or(0.0)
                    } else {
                        0.0
                    }
                })
                .sum();
            let mean = total / required as f64;
            let base = self.settings.quality_base;
            out.push(ContextAdjustment {
                kind: EnhancementKind::DataQuality,
                factor: base + (1.0 - base) * mean,
                reasoning: format!("Mean field relevance {:.2}", mean),
            });
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_router_core::{
        BaseIntent, Category, EndpointId, FieldCharacteristics, RoutingHistory,
    };
    use std::sync::Arc;

    const DOMAIN: &str = r#"
name: retail
endpoint_mappings:
  /competitive-analysis:
    primary_intents: [competitive_analysis]
    required_fields: [competitor_count, market_share]
  /market-overview:
    primary_intents: [comprehensive_overview]
"#;

    fn config() -> DomainConfiguration {
        DomainConfiguration::from_yaml_str(DOMAIN).unwrap()
    }

    fn candidate(id: &str, score: f64) -> EndpointCandidate {
        EndpointCandidate::new(
            EndpointId::parse(id).unwrap(),
            score,
            vec![BaseIntent::CompetitiveAnalysis],
        )
    }

    fn field(name: &str) -> geo_router_core::FieldName {
        geo_router_core::FieldName::parse(name).unwrap()
    }

    fn dataset() -> DatasetContext {
        let category = Category::parse("competition").unwrap();
        DatasetContext::new()
            .with_field(category.clone(), field("competitor_count"), FieldCharacteristics::complete())
            .with_field(category, field("market_share"), FieldCharacteristics::complete())
    }

    fn pattern() -> QueryPattern {
        QueryPattern::from_terms(["competitor", "area"])
    }

    #[test]
    fn test_complete_dataset_is_neutral() {
        let enhanced = ContextEnhancer::default()
            .enhance(vec![candidate("/competitive-analysis", 0.8)], &pattern(), &dataset(), &config())
            .unwrap();
        assert!((enhanced[0].final_confidence - 0.8).abs() < 1e-9);
        assert_eq!(enhanced[0].enhancements.len(), 2);
    }

    #[test]
    fn test_missing_field_reduces() {
        let mut ds = dataset();
        ds.remove_field(&field("market_share"));
        let enhanced = ContextEnhancer::default()
            .enhance(vec![candidate("/competitive-analysis", 0.8)], &pattern(), &ds, &config())
            .unwrap();
        // availability 0.75, quality 0.85
        assert!((enhanced[0].final_confidence - 0.8 * 0.75 * 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_no_required_fields_is_neutral() {
        let enhanced = ContextEnhancer::default()
            .enhance(vec![candidate("/market-overview", 0.3)], &pattern(), &DatasetContext::new(), &config())
            .unwrap();
        assert!((enhanced[0].final_confidence - 0.3).abs() < 1e-9);
        assert!(enhanced[0].enhancements.is_empty());
    }

    #[test]
    fn test_history_boost() {
        let history = Arc::new(RoutingHistory::default());
        let endpoint = EndpointId::parse("/competitive-analysis").unwrap();
        history.record(pattern(), endpoint, true);
        let ds = dataset().with_history(history);

        let enhanced = ContextEnhancer::default()
            .enhance(vec![candidate("/competitive-analysis", 0.5)], &pattern(), &ds, &config())
            .unwrap();
        assert!((enhanced[0].final_confidence - 0.65).abs() < 1e-9);
        assert!(enhanced[0]
            .enhancements
            .iter()
            .any(|e| e.kind == EnhancementKind::HistoricalMatch));
    }

    #[test]
    fn test_history_below_success_level_earns_no_boost() {
        let history = Arc::new(RoutingHistory::default());
        let endpoint = EndpointId::parse("/competitive-analysis").unwrap();
        for i in 0..10 {
            history.record(pattern(), endpoint.clone(), i < 7);
        }
        let ds = dataset().with_history(history.clone());

        let enhanced = ContextEnhancer::default()
            .enhance(vec![candidate("/competitive-analysis", 0.5)], &pattern(), &ds, &config())
            .unwrap();
        assert!((enhanced[0].final_confidence - 0.5).abs() < 1e-9);
        assert!(enhanced[0]
            .enhancements
            .iter()
            .all(|e| e.kind != EnhancementKind::HistoricalMatch));

        // 37 of 40: halfway between 0.85 and 1.0
        for _ in 0..30 {
            history.record(pattern(), endpoint.clone(), true);
        }
        let ds = dataset().with_history(history);
        let enhanced = ContextEnhancer::default()
            .enhance(vec![candidate("/competitive-analysis", 0.5)], &pattern(), &ds, &config())
            .unwrap();
        assert!((enhanced[0].final_confidence - 0.5 * 1.15).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_endpoint_is_invariant_violation() {
        let err = ContextEnhancer::default()
            .enhance(vec![candidate("/nowhere", 0.5)], &pattern(), &dataset(), &config())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::EngineError::Router(RouterError::InvariantViolation(_))
        ));
    }
}
