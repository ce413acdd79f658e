//! Routing decisions and the terminal routing result

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::candidate::EndpointCandidate;
use crate::ids::EndpointId;
use crate::intent::BaseIntent;
use crate::validation::ValidationResult;

/// What the engine decided to do with a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingAction {
    Route,
    RouteWithWarning,
    FallbackWithExplanation,
    RequestClarification,
    Reject,
}

impl RoutingAction {
    /// 0 = plain route, 4 = reject; higher is more conservative
    pub fn conservativeness(&self) -> u8 {
        match self {
            Self::Route => 0,
            Self::RouteWithWarning => 1,
            Self::FallbackWithExplanation => 2,
            Self::RequestClarification => 3,
            Self::Reject => 4,
        }
    }

    /// The more conservative of two actions
    pub fn at_least(self, floor: RoutingAction) -> RoutingAction {
        if self.conservativeness() >= floor.conservativeness() {
            self
        } else {
            floor
        }
    }

    /// Whether the query ends up at an endpoint
    pub fn is_routed(&self) -> bool {
        matches!(
            self,
            Self::Route | Self::RouteWithWarning | Self::FallbackWithExplanation
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::RouteWithWarning => "route_with_warning",
            Self::FallbackWithExplanation => "fallback_with_explanation",
            Self::RequestClarification => "request_clarification",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for RoutingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence manager output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRecommendation {
    pub action: RoutingAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub confidence: f64,
    /// Why the table landed on this row
    pub reasoning: Vec<String>,
}

/// Pipeline states a query passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStage {
    Received,
    Validated,
    Rejected,
    IntentClassified,
    DomainEnhanced,
    ContextBoosted,
    Recommended,
    Routed,
    Warned,
    Fallback,
    Clarify,
}

impl RoutingStage {
    /// Terminal stage for an action
    pub fn terminal(action: RoutingAction) -> Self {
        match action {
            RoutingAction::Route => Self::Routed,
            RoutingAction::RouteWithWarning => Self::Warned,
            RoutingAction::FallbackWithExplanation => Self::Fallback,
            RoutingAction::RequestClarification => Self::Clarify,
            RoutingAction::Reject => Self::Rejected,
        }
    }
}

/// Intent summary carried on the result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentSummary {
    pub intent: BaseIntent,
    pub score: f64,
}

/// Shape of the user-facing payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Answer,
    Warning,
    Fallback,
    Clarification,
    Rejection,
}

impl From<RoutingAction> for ResponseKind {
    fn from(action: RoutingAction) -> Self {
        match action {
            RoutingAction::Route => Self::Answer,
            RoutingAction::RouteWithWarning => Self::Warning,
            RoutingAction::FallbackWithExplanation => Self::Fallback,
            RoutingAction::RequestClarification => Self::Clarification,
            RoutingAction::Reject => Self::Rejection,
        }
    }
}

/// Payload handed to the response renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub kind: ResponseKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_message: Option<String>,
}

/// Terminal artifact of one routing call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    pub query: String,
    pub domain: String,
    pub success: bool,
    pub action: RoutingAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub validation: ValidationResult,
    pub intents: Vec<IntentSummary>,
    /// Endpoints offered besides (or instead of) the chosen one, with their
    /// full score breakdown
    pub alternatives: Vec<EndpointCandidate>,
    pub reasoning: Vec<String>,
    pub stages: Vec<RoutingStage>,
    pub user_response: UserResponse,
}

impl RoutingResult {
    /// Final stage reached
    pub fn terminal_stage(&self) -> Option<RoutingStage> {
        self.stages.last().copied()
    }
}
