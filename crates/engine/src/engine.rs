//! Hybrid routing engine
//!
//! Sequences the layers for one query:
//!
//! ```text
//! Received → Validated ─┬─> Rejected                       (malformed / clearly out of scope)
//!                       └─> IntentClassified → DomainEnhanced → ContextBoosted
//!                             → Recommended → Routed | Warned | Fallback | Clarify | Rejected
//! ```
//!
//! Routing never mutates shared state. Only feedback changes the routing
//! history and the confidence thresholds, and the active domain is swapped
//! atomically so in-flight queries finish on the snapshot they started with.

use arc_swap::ArcSwap;
use std::sync::Arc;

use geo_router_config::{DomainConfiguration, RouterSettings};
use geo_router_core::{
    DatasetContext, DatasetProvider, EndpointCandidate, FeedbackRecord, FeedbackSink,
    IntentSummary, QueryPattern, ResponseKind, RouterError, RoutingAction,
    RoutingHistory, RoutingRecommendation, RoutingResult, RoutingStage, UserResponse,
    ValidationResult,
};
use geo_router_text_processing::{BaseIntentClassifier, QueryValidator, Tokenizer};

use crate::adapter::{VocabularyAdapter, VocabularyIndex};
use crate::compound::QueryDecomposer;
use crate::confidence::{ConfidenceManager, ConfidenceThresholds, ThresholdUpdate};
use crate::context::ContextEnhancer;
use crate::feedback::FeedbackBuffer;
use crate::Result;

/// Alternatives offered alongside a decision
const MAX_ALTERNATIVES: usize = 3;
/// Intents listed on the result
const MAX_INTENT_SUMMARIES: usize = 5;

/// A domain configuration with its stemmed vocabulary index
#[derive(Debug)]
pub struct ActiveDomain {
    pub config: Arc<DomainConfiguration>,
    pub index: VocabularyIndex,
}

impl ActiveDomain {
    pub fn new(config: DomainConfiguration) -> Self {
        let index = VocabularyIndex::build(&config);
        Self {
            config: Arc::new(config),
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }
}

/// Query routing orchestrator
pub struct HybridRoutingEngine {
    domain: ArcSwap<ActiveDomain>,
    tokenizer: Tokenizer,
    classifier: BaseIntentClassifier,
    validator: QueryValidator,
    adapter: VocabularyAdapter,
    context: ContextEnhancer,
    confidence: ConfidenceManager,
    decomposer: QueryDecomposer,
    history: Arc<RoutingHistory>,
    feedback: FeedbackBuffer,
}

impl HybridRoutingEngine {
    /// Build an engine over a loaded domain
    pub fn new(config: DomainConfiguration, settings: &RouterSettings) -> Result<Self> {
        settings.validate()?;

        let classifier = BaseIntentClassifier::new();
        let engine = Self {
            domain: ArcSwap::from_pointee(ActiveDomain::new(config)),
            tokenizer: Tokenizer::new(),
            validator: QueryValidator::new(settings.validator)?,
            adapter: VocabularyAdapter::new(settings.adapter, classifier.clone()),
            classifier,
            context: ContextEnhancer::new(settings.context),
            confidence: ConfidenceManager::new(
                settings.thresholds.into(),
                settings.tuning,
                settings.validator.out_of_scope_threshold,
            ),
            decomposer: QueryDecomposer::new(&settings.decomposition)?,
            history: Arc::new(RoutingHistory::new(settings.context.history_capacity)),
            feedback: FeedbackBuffer::default(),
        };

        tracing::info!(
            domain = %engine.domain.load().name(),
            endpoints = engine.domain.load().config.endpoint_mappings.len(),
            "Routing engine ready"
        );
        Ok(engine)
    }

    /// Engine with default settings
    pub fn with_defaults(config: DomainConfiguration) -> Result<Self> {
        Self::new(config, &RouterSettings::default())
    }

    /// Swap the active domain; queries already running keep the old one
    pub fn set_active(&self, config: DomainConfiguration) {
        let name = config.name.clone();
        let endpoints = config.endpoint_mappings.len();
        self.domain.store(Arc::new(ActiveDomain::new(config)));
        tracing::info!(domain = %name, endpoints, "Activated domain");
    }

    /// Snapshot of the active domain
    pub fn active_domain(&self) -> Arc<ActiveDomain> {
        self.domain.load_full()
    }

    pub fn thresholds(&self) -> ConfidenceThresholds {
        self.confidence.thresholds()
    }

    pub fn history(&self) -> Arc<RoutingHistory> {
        Arc::clone(&self.history)
    }

    /// Attach the engine's routing history to a dataset snapshot
    pub fn bind_dataset(&self, dataset: DatasetContext) -> DatasetContext {
        dataset.with_history(self.history())
    }

    pub fn feedback_sink(&self) -> &FeedbackBuffer {
        &self.feedback
    }

    /// Route one query against the active domain
    pub fn route(&self, query: &str, dataset: &DatasetContext) -> Result<RoutingResult> {
        let domain = self.active_domain();
        self.route_with_domain(query, &domain, dataset)
    }

    /// Route one query with a dataset snapshot taken from a provider
    pub fn route_with_provider(
        &self,
        query: &str,
        provider: &dyn DatasetProvider,
    ) -> Result<RoutingResult> {
        let dataset = provider.snapshot()?;
        self.route(query, &dataset)
    }

    /// Route one query against an explicit domain snapshot
    pub fn route_with_domain(
        &self,
        query: &str,
        domain: &ActiveDomain,
        dataset: &DatasetContext,
    ) -> Result<RoutingResult> {
        match self.route_inner(query, domain, dataset) {
            Ok(result) => {
                metrics::counter!("geo_router_routes_total", "action" => result.action.as_str())
                    .increment(1);
                if let Some(confidence) = result.confidence {
                    metrics::histogram!("geo_router_confidence").record(confidence);
                }
                tracing::info!(
                    action = %result.action,
                    endpoint = ?result.endpoint.as_ref().map(|e| e.as_str()),
                    confidence = ?result.confidence,
                    scope = %result.validation.scope,
                    "Routed query"
                );
                Ok(result)
            }
            Err(e) => {
                metrics::counter!("geo_router_routing_errors_total").increment(1);
                tracing::error!(error = %e, domain = %domain.name(), "Routing aborted");
                Err(e)
            }
        }
    }

    /// Split on connectors and route every segment independently
    pub fn route_compound(
        &self,
        query: &str,
        dataset: &DatasetContext,
    ) -> Result<Vec<RoutingResult>> {
        let domain = self.active_domain();
        let segments = self.decomposer.split(query);
        if segments.len() > 1 {
            tracing::debug!(segments = segments.len(), "Routing compound query");
        }
        segments
            .into_iter()
            .map(|segment| self.route_with_domain(segment, &domain, dataset))
            .collect()
    }

    /// Queue feedback for the next `apply_feedback`
    pub fn record_feedback(&self, record: FeedbackRecord) {
        self.feedback.submit(record);
    }

    /// Drain queued feedback into the history and the thresholds
    pub fn apply_feedback(&self) -> ThresholdUpdate {
        let batch = self.feedback.drain();
        self.learn(&batch)
    }

    /// Learn from a feedback batch directly
    ///
    /// Every record updates the history; thresholds only move when the batch
    /// reaches the configured minimum size.
    pub fn learn(&self, batch: &[FeedbackRecord]) -> ThresholdUpdate {
        for record in batch {
            let pattern = self.pattern_of(&record.query);
            self.history
                .record(pattern, record.chosen_endpoint.clone(), record.was_correct);
        }
        self.confidence.adjust_thresholds(batch)
    }

    fn pattern_of(&self, query: &str) -> QueryPattern {
        QueryPattern::from_terms(self.tokenizer.tokenize(query).tokens)
    }

    fn route_inner(
        &self,
        query: &str,
        domain: &ActiveDomain,
        dataset: &DatasetContext,
    ) -> Result<RoutingResult> {
        let thresholds = self.confidence.snapshot();
        let mut trace = Trace::new();

        // 1. Scope validation
        let validation = self.validator.validate(query, &domain.config);
        trace.stage(RoutingStage::Validated);
        trace.note(format!(
            "Validation: {} ({:.2}){}",
            validation.scope,
            validation.confidence,
            if validation.reasons.is_empty() {
                String::new()
            } else {
                format!(": {}", validation.reasons.join("; "))
            }
        ));

        if validation.is_terminal_rejection(self.confidence.rejection_confidence()) {
            let recommendation = self.confidence.recommend(None, &validation, &thresholds);
            trace.extend(&recommendation.reasoning);
            trace.stage(RoutingStage::Rejected);
            return Ok(self.build_result(
                query,
                domain,
                validation,
                recommendation,
                &[],
                Vec::new(),
                trace,
            ));
        }

        // 2. Base intents
        let tokenized = self.tokenizer.tokenize(query);
        let ranked = self.classifier.classify(&tokenized.tokens);
        trace.stage(RoutingStage::IntentClassified);
        match ranked.top() {
            Some(top) => trace.note(top.explain()),
            None => trace.note("No base intent matched".to_string()),
        }

        // 3. Domain vocabulary
        let enhanced = self
            .adapter
            .enhance(query, &tokenized, &ranked, &domain.index);
        trace.extend(&enhanced.reasoning);
        let candidates = self
            .adapter
            .candidates(&enhanced, &domain.config, &domain.index)?;
        trace.stage(RoutingStage::DomainEnhanced);
        tracing::debug!(candidates = candidates.len(), "Generated endpoint candidates");

        // 4. Dataset context
        let candidates =
            self.context
                .enhance(candidates, &enhanced.pattern(), dataset, &domain.config)?;
        trace.stage(RoutingStage::ContextBoosted);
        for candidate in candidates.iter().take(MAX_ALTERNATIVES + 1) {
            trace.note(describe_candidate(candidate));
        }

        // 5. Recommendation
        let top = match candidates.first() {
            Some(candidate) => {
                let spec = domain.config.endpoint(&candidate.endpoint).ok_or_else(|| {
                    RouterError::InvariantViolation(format!(
                        "top candidate {} is not defined in domain '{}'",
                        candidate.endpoint,
                        domain.name()
                    ))
                })?;
                Some((candidate, spec))
            }
            None => None,
        };
        let recommendation = self.confidence.recommend(top, &validation, &thresholds);
        trace.extend(&recommendation.reasoning);
        trace.stage(RoutingStage::Recommended);
        trace.stage(RoutingStage::terminal(recommendation.action));

        let intents = enhanced
            .intents
            .top_n(MAX_INTENT_SUMMARIES, 0.0)
            .into_iter()
            .map(|s| IntentSummary {
                intent: s.intent,
                score: s.score,
            })
            .collect();

        Ok(self.build_result(
            query,
            domain,
            validation,
            recommendation,
            &candidates,
            intents,
            trace,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_result(
        &self,
        query: &str,
        domain: &ActiveDomain,
        validation: ValidationResult,
        recommendation: RoutingRecommendation,
        candidates: &[EndpointCandidate],
        intents: Vec<IntentSummary>,
        trace: Trace,
    ) -> RoutingResult {
        let action = recommendation.action;
        let routed = action.is_routed();
        let chosen = if routed { candidates.first() } else { None };

        let skip = usize::from(chosen.is_some());
        let alternatives: Vec<EndpointCandidate> = candidates
            .iter()
            .skip(skip)
            .filter(|c| c.final_confidence > 0.0)
            .take(MAX_ALTERNATIVES)
            .cloned()
            .collect();

        let user_response = self.user_response(
            action,
            &recommendation,
            &validation,
            domain,
            chosen,
            &alternatives,
        );

        RoutingResult {
            query: query.to_string(),
            domain: domain.name().to_string(),
            success: routed,
            action,
            endpoint: chosen.map(|c| c.endpoint.clone()),
            confidence: chosen.map(|c| c.final_confidence),
            validation,
            intents,
            alternatives,
            reasoning: trace.notes,
            stages: trace.stages,
            user_response,
        }
    }

    fn user_response(
        &self,
        action: RoutingAction,
        recommendation: &RoutingRecommendation,
        validation: &ValidationResult,
        domain: &ActiveDomain,
        chosen: Option<&EndpointCandidate>,
        alternatives: &[EndpointCandidate],
    ) -> UserResponse {
        let chosen = chosen.and_then(|c| domain.config.endpoint(&c.endpoint));
        let kind = ResponseKind::from(action);
        let message = match (&recommendation.message, chosen) {
            (Some(message), _) => message.clone(),
            (None, Some(spec)) => format!("Routing to {}.", spec.display_name),
            (None, None) => String::new(),
        };

        let hedged = matches!(
            action,
            RoutingAction::RequestClarification | RoutingAction::Reject
        );
        let mut suggestions = Vec::new();
        let mut redirect_message = None;
        if hedged || action == RoutingAction::FallbackWithExplanation {
            suggestions.extend(validation.suggestions.iter().cloned());
            for spec in alternatives
                .iter()
                .filter_map(|alt| domain.config.endpoint(&alt.endpoint))
            {
                suggestions.push(if spec.description.is_empty() {
                    format!("Ask about {}", spec.display_name)
                } else {
                    format!("Ask about {}: {}", spec.display_name, spec.description)
                });
            }
        }
        if hedged {
            redirect_message = validation.redirect_message.clone();
            if suggestions.is_empty() && redirect_message.is_none() {
                suggestions.push(
                    "Name what to measure and where, e.g. \"top areas by sales growth\"".to_string(),
                );
            }
        }

        UserResponse {
            kind,
            message,
            suggestions,
            redirect_message,
        }
    }
}

/// Reasoning notes and visited stages of one query
struct Trace {
    notes: Vec<String>,
    stages: Vec<RoutingStage>,
}

impl Trace {
    fn new() -> Self {
        Self {
            notes: Vec::new(),
            stages: vec![RoutingStage::Received],
        }
    }

    fn stage(&mut self, stage: RoutingStage) {
        tracing::debug!(stage = ?stage, "Routing stage");
        self.stages.push(stage);
    }

    fn note(&mut self, note: String) {
        self.notes.push(note);
    }

    fn extend(&mut self, notes: &[String]) {
        self.notes.extend(notes.iter().cloned());
    }
}

fn describe_candidate(c: &EndpointCandidate) -> String {
    let mut parts = vec![format!(
        "{}: base {:.2}, domain {:.2}, final {:.2}",
        c.endpoint, c.base_score, c.domain_score, c.final_confidence
    )];
    for e in &c.enhancements {
        parts.push(format!("{} x{:.2} ({})", e.kind, e.impact, e.reasoning));
    }
    for p in &c.penalties {
        parts.push(format!("-{:.0}% ({})", p.penalty * 100.0, p.reasoning));
    }
    parts.join("; ")
}
