//! Confidence management
//!
//! Turns the best candidate and the validation result into a routing action,
//! and retunes the thresholds from feedback batches.
//!
//! # Decision table
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Malformed, or OutOfScope with high confidence | `reject` |
//! | confidence ≥ high | `route` |
//! | confidence ≥ medium | `route_with_warning` |
//! | confidence ≥ low | `fallback_with_explanation` |
//! | confidence ≥ validation_floor | `request_clarification` |
//! | otherwise | `reject` |
//!
//! Borderline scope caps the action at `route_with_warning`, a soft
//! OutOfScope at `request_clarification`, and an endpoint's own threshold
//! turns a plain `route` into `route_with_warning`.
//!
//! Thresholds live behind an `ArcSwap`: readers take a snapshot per query and
//! tuning publishes a new value with read-copy-update.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use geo_router_config::{EndpointSpec, ThresholdSettings, TuningSettings};
use geo_router_core::{
    EndpointCandidate, FeedbackRecord, QueryScope, RoutingAction, RoutingRecommendation,
    ValidationResult,
};

/// Confidence bands, `validation_floor <= low <= medium <= high`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
    pub validation_floor: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        ThresholdSettings::default().into()
    }
}

impl From<ThresholdSettings> for ConfidenceThresholds {
    fn from(s: ThresholdSettings) -> Self {
        Self {
            high: s.high,
            medium: s.medium,
            low: s.low,
            validation_floor: s.validation_floor,
        }
    }
}

impl ConfidenceThresholds {
    /// Band lookup for a candidate confidence
    pub fn action_for(&self, confidence: f64) -> RoutingAction {
        if confidence >= self.high {
            RoutingAction::Route
        } else if confidence >= self.medium {
            RoutingAction::RouteWithWarning
        } else if confidence >= self.low {
            RoutingAction::FallbackWithExplanation
        } else if confidence >= self.validation_floor {
            RoutingAction::RequestClarification
        } else {
            RoutingAction::Reject
        }
    }

    pub fn is_ordered(&self) -> bool {
        0.0 <= self.validation_floor
            && self.validation_floor <= self.low
            && self.low <= self.medium
            && self.medium <= self.high
            && self.high <= 1.0
    }
}

/// Which way a feedback batch moved the thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningDirection {
    Raised,
    Lowered,
    Unchanged,
}

/// Outcome of one `adjust_thresholds` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    pub previous: ConfidenceThresholds,
    pub current: ConfidenceThresholds,
    pub batch_size: usize,
    /// `None` when the batch was too small to count
    pub success_rate: Option<f64>,
    pub direction: TuningDirection,
}

/// Adaptive confidence manager
#[derive(Debug)]
pub struct ConfidenceManager {
    thresholds: ArcSwap<ConfidenceThresholds>,
    tuning: TuningSettings,
    /// Validator confidence at which OutOfScope is final
    rejection_confidence: f64,
}

impl ConfidenceManager {
    pub fn new(
        thresholds: ConfidenceThresholds,
        tuning: TuningSettings,
        rejection_confidence: f64,
    ) -> Self {
        Self {
            thresholds: ArcSwap::from_pointee(thresholds),
            tuning,
            rejection_confidence,
        }
    }

    /// Current thresholds
    pub fn thresholds(&self) -> ConfidenceThresholds {
        **self.thresholds.load()
    }

    /// Snapshot held for the duration of one query
    pub fn snapshot(&self) -> Arc<ConfidenceThresholds> {
        self.thresholds.load_full()
    }

    pub fn rejection_confidence(&self) -> f64 {
        self.rejection_confidence
    }

    /// Decide what to do with the best candidate
    pub fn recommend(
        &self,
        top: Option<(&EndpointCandidate, &EndpointSpec)>,
        validation: &ValidationResult,
        thresholds: &ConfidenceThresholds,
    ) -> RoutingRecommendation {
        let mut reasoning = Vec::new();

        match validation.scope {
            QueryScope::Malformed => {
                reasoning.push("Query is malformed".to_string());
                return RoutingRecommendation {
                    action: RoutingAction::Reject,
                    message: Some("I couldn't understand that query.".to_string()),
                    confidence: validation.confidence,
                    reasoning,
                };
            }
            QueryScope::OutOfScope if validation.confidence >= self.rejection_confidence => {
                reasoning.push(format!(
                    "Out of scope with confidence {:.2}",
                    validation.confidence
                ));
                return RoutingRecommendation {
                    action: RoutingAction::Reject,
                    message: Some("That question is outside what I can analyze.".to_string()),
                    confidence: validation.confidence,
                    reasoning,
                };
            }
            _ => {}
        }

        let Some((candidate, spec)) = top else {
            reasoning.push("No endpoint serves the detected intents".to_string());
            return RoutingRecommendation {
                action: RoutingAction::Reject,
                message: Some("I couldn't match that question to any analysis.".to_string()),
                confidence: 0.0,
                reasoning,
            };
        };

        let confidence = candidate.final_confidence;
        let mut action = thresholds.action_for(confidence);
        reasoning.push(format!(
            "Confidence {:.2} for {} maps to {} (high {:.2}, medium {:.2}, low {:.2}, floor {:.2})",
            confidence,
            candidate.endpoint,
            action,
            thresholds.high,
            thresholds.medium,
            thresholds.low,
            thresholds.validation_floor
        ));

        if action == RoutingAction::Route && confidence < spec.confidence_threshold {
            action = RoutingAction::RouteWithWarning;
            reasoning.push(format!(
                "Below the endpoint threshold {:.2}",
                spec.confidence_threshold
            ));
        }

        let capped = match validation.scope {
            QueryScope::Borderline => action.at_least(RoutingAction::RouteWithWarning),
            QueryScope::OutOfScope => action.at_least(RoutingAction::RequestClarification),
            _ => action,
        };
        if capped != action {
            reasoning.push(format!(
                "Scope {} limits the action to {}",
                validation.scope, capped
            ));
            action = capped;
        }

        let message = match action {
            RoutingAction::Route => None,
            RoutingAction::RouteWithWarning => Some(format!(
                "Routing to {}, but the match is not certain.",
                spec.display_name
            )),
            RoutingAction::FallbackWithExplanation => Some(format!(
                "{} is the closest analysis available, but may not fully answer the question.",
                spec.display_name
            )),
            RoutingAction::RequestClarification => {
                Some("Could you be more specific about what you want to analyze?".to_string())
            }
            RoutingAction::Reject => {
                Some("I couldn't confidently match that question to an analysis.".to_string())
            }
        };

        RoutingRecommendation {
            action,
            message,
            confidence,
            reasoning,
        }
    }

    /// Retune `high` and `medium` from a feedback batch
    ///
    /// Batches smaller than the configured minimum leave thresholds unchanged.
    pub fn adjust_thresholds(&self, batch: &[FeedbackRecord]) -> ThresholdUpdate {
        let previous = self.thresholds();
        let batch_size = batch.len();

        if batch_size < self.tuning.min_batch_size {
            tracing::debug!(
                batch_size,
                min = self.tuning.min_batch_size,
                "Feedback batch too small for tuning"
            );
            return ThresholdUpdate {
                previous,
                current: previous,
                batch_size,
                success_rate: None,
                direction: TuningDirection::Unchanged,
            };
        }

        let successes = batch.iter().filter(|r| r.was_correct).count();
        let rate = successes as f64 / batch_size as f64;
        let direction = if rate < self.tuning.raise_below {
            TuningDirection::Raised
        } else if rate > self.tuning.lower_above {
            TuningDirection::Lowered
        } else {
            TuningDirection::Unchanged
        };

        let mut before = previous;
        let mut after = previous;
        if direction != TuningDirection::Unchanged {
            self.thresholds.rcu(|current| {
                before = **current;
                after = tune(**current, direction, &self.tuning);
                after
            });
        }

        if after != before {
            tracing::info!(
                success_rate = rate,
                batch_size,
                high = after.high,
                medium = after.medium,
                direction = ?direction,
                "Adjusted confidence thresholds"
            );
            metrics::gauge!("geo_router_threshold", "level" => "high").set(after.high);
            metrics::gauge!("geo_router_threshold", "level" => "medium").set(after.medium);
        }

        ThresholdUpdate {
            previous: before,
            current: after,
            batch_size,
            success_rate: Some(rate),
            direction,
        }
    }
}

/// One tuning step; never moves a threshold against `direction`
fn tune(
    current: ConfidenceThresholds,
    direction: TuningDirection,
    tuning: &TuningSettings,
) -> ConfidenceThresholds {
    let mut next = current;
    match direction {
        TuningDirection::Raised => {
            next.high = next.high.max((next.high + tuning.raise_step).min(tuning.high_cap));
            next.medium = next
                .medium
                .max((next.medium + tuning.raise_step).min(tuning.medium_cap));
        }
        TuningDirection::Lowered => {
            next.high = next.high.min((next.high - tuning.lower_step).max(tuning.high_floor));
            next.medium = next
                .medium
                .min((next.medium - tuning.lower_step).max(tuning.medium_floor));
        }
        TuningDirection::Unchanged => {}
    }
    next.high = next.high.clamp(next.low, 1.0);
    next.medium = next.medium.clamp(next.low, next.high);
    next
}
