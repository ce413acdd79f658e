//! Property tests for scoring and threshold invariants

mod common;

use std::sync::Arc;

use common::*;
use geo_router_config::TuningSettings;
use geo_router_core::{
    BaseIntent, EndpointCandidate, EndpointId, FeedbackRecord, QueryPattern, QueryScope,
    RoutingAction, RoutingHistory,
};
use geo_router_engine::{ConfidenceManager, ConfidenceThresholds, ContextEnhancer};
use proptest::prelude::*;
use proptest::sample::subsequence;

const FIELDS: [&str; 4] = ["competitor_count", "market_share", "population", "median_income"];

const REJECTION_TOPICS: [&[&str]; 4] = [
    &["recipe", "dating", "horoscope", "vacation"],
    &["password", "login", "printer", "wifi"],
    &["weather", "forecast", "celebrity", "capital"],
    &["poem", "song", "joke", "story"],
];

fn candidate(endpoint: &str, score: f64) -> EndpointCandidate {
    EndpointCandidate::new(
        EndpointId::parse(endpoint).unwrap(),
        score,
        vec![BaseIntent::CompetitiveAnalysis],
    )
}

proptest! {
    #[test]
    fn prop_removing_required_fields_never_raises_confidence(
        score in 0.0f64..1.0,
        removed in subsequence(FIELDS.to_vec(), 0..=4),
    ) {
        let config = retail();
        let pattern = QueryPattern::from_terms(["competitiv", "area"]);
        let enhancer = ContextEnhancer::default();
        let full = full_dataset();
        let mut partial = full_dataset();
        for name in &removed {
            partial.remove_field(&field(name));
        }

        for endpoint in ["/competitive-analysis", "/demographic-insights", "/market-overview"] {
            let with_all = enhancer
                .enhance(vec![candidate(endpoint, score)], &pattern, &full, &config)
                .unwrap();
            let with_fewer = enhancer
                .enhance(vec![candidate(endpoint, score)], &pattern, &partial, &config)
                .unwrap();
            prop_assert!(with_fewer[0].final_confidence <= with_all[0].final_confidence + 1e-12);
        }
    }

    #[test]
    fn prop_context_factors_commute(
        score in 0.0f64..1.0,
        removed in subsequence(FIELDS.to_vec(), 0..=4),
        order in Just(vec![0usize, 1, 2]).prop_shuffle(),
    ) {
        let config = retail();
        let pattern = QueryPattern::from_terms(["competitiv", "advantag", "scor"]);
        let history = Arc::new(RoutingHistory::default());
        history.record(
            pattern.clone(),
            EndpointId::parse("/competitive-analysis").unwrap(),
            true,
        );
        let mut dataset = full_dataset().with_history(history);
        for name in &removed {
            dataset.remove_field(&field(name));
        }

        let enhancer = ContextEnhancer::default();
        let base = candidate("/competitive-analysis", score);
        let adjustments = enhancer.adjustments(&base, &pattern, &dataset, &config).unwrap();

        let mut in_order = base.clone();
        for a in &adjustments {
            in_order.apply_context_factor(a.kind, a.factor, a.reasoning.clone());
        }
        let mut shuffled = base;
        for i in order.iter().filter(|i| **i < adjustments.len()) {
            let a = &adjustments[*i];
            shuffled.apply_context_factor(a.kind, a.factor, a.reasoning.clone());
        }

        prop_assert!((in_order.final_confidence - shuffled.final_confidence).abs() < 1e-9);
    }

    #[test]
    fn prop_tuning_keeps_thresholds_ordered_and_bounded(
        batches in prop::collection::vec(prop::collection::vec(any::<bool>(), 0..20), 1..30),
    ) {
        let tuning = TuningSettings::default();
        let manager = ConfidenceManager::new(ConfidenceThresholds::default(), tuning, 0.8);
        let endpoint = EndpointId::parse("/competitive-analysis").unwrap();

        for outcomes in batches {
            let batch: Vec<FeedbackRecord> = outcomes
                .iter()
                .map(|ok| FeedbackRecord::new("rank areas", endpoint.clone(), *ok))
                .collect();
            let update = manager.adjust_thresholds(&batch);
            let t = update.current;

            prop_assert!(t.is_ordered());
            prop_assert!(t.high <= tuning.high_cap + 1e-12);
            prop_assert!(t.high >= tuning.high_floor - 1e-12);
            prop_assert!(t.medium <= tuning.medium_cap + 1e-12);
            prop_assert!(t.medium >= tuning.medium_floor - 1e-12);
            prop_assert_eq!(manager.thresholds(), t);
        }
    }

    #[test]
    fn prop_domain_phrased_queries_are_in_scope(
        action in prop::sample::select(vec!["analyze", "show", "compare", "rank", "identify", "find"]),
        subject in prop::sample::select(vec!["market", "store", "area", "competitor", "customer", "sales"]),
        context in prop::sample::select(vec!["score", "region", "trend"]),
    ) {
        let engine = engine();
        let query = format!("{} {} by {}", action, subject, context);
        let result = engine.route(&query, &full_dataset()).unwrap();
        prop_assert_eq!(result.validation.scope, QueryScope::InScope);
    }

    #[test]
    fn prop_two_rejection_terms_are_never_routed(
        topic in 0usize..4,
        pair in subsequence(vec![0usize, 1, 2, 3], 2),
    ) {
        let engine = engine();
        let words = REJECTION_TOPICS[topic];
        let query = format!("{} {} tomorrow", words[pair[0]], words[pair[1]]);
        let result = engine.route(&query, &full_dataset()).unwrap();

        prop_assert_eq!(result.action, RoutingAction::Reject);
        prop_assert_eq!(result.validation.scope, QueryScope::OutOfScope);
        prop_assert!(result.endpoint.is_none());
        prop_assert!(result.user_response.redirect_message.is_some());
    }
}
