//! Response rendering

use crate::routing::RoutingResult;

/// Turns a routing result into presentation text
pub trait ResponseRenderer: Send + Sync {
    fn render(&self, result: &RoutingResult) -> String;
}

/// Minimal line-oriented renderer used by the CLI
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

impl ResponseRenderer for PlainTextRenderer {
    fn render(&self, result: &RoutingResult) -> String {
        let mut out = format!("[{}] {}", result.action, result.user_response.message);
        if let (Some(endpoint), Some(confidence)) = (&result.endpoint, result.confidence) {
            out.push_str(&format!("\n  endpoint: {} ({:.2})", endpoint, confidence));
        }
        if let Some(redirect) = &result.user_response.redirect_message {
            out.push_str(&format!("\n  {}", redirect));
        }
        for suggestion in &result.user_response.suggestions {
            out.push_str(&format!("\n  - {}", suggestion));
        }
        for alt in &result.alternatives {
            out.push_str(&format!(
                "\n  alt: {} ({:.2}) {}",
                alt.endpoint,
                alt.final_confidence,
                alt.endpoint.as_phrase()
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::EndpointId;
    use crate::candidate::EndpointCandidate;
    use crate::intent::BaseIntent;
    use crate::routing::{ResponseKind, RoutingAction, UserResponse};
    use crate::validation::ValidationResult;

    #[test]
    fn test_plain_text_lists_endpoint_and_alternatives() {
        let endpoint = EndpointId::parse("/market-overview").unwrap();
        let result = RoutingResult {
            query: "Analyze the market".into(),
            domain: "retail".into(),
            success: true,
            action: RoutingAction::RouteWithWarning,
            endpoint: Some(endpoint.clone()),
            confidence: Some(0.61),
            validation: ValidationResult::in_scope(0.9, 0.6),
            intents: Vec::new(),
            alternatives: vec![EndpointCandidate::new(
                EndpointId::parse("/data-exploration").unwrap(),
                0.42,
                vec![BaseIntent::GeneralExploration],
            )],
            reasoning: Vec::new(),
            stages: Vec::new(),
            user_response: UserResponse {
                kind: ResponseKind::Warning,
                message: "Routing to Market Overview".into(),
                suggestions: vec!["Name a region".into()],
                redirect_message: None,
            },
        };

        let text = PlainTextRenderer.render(&result);
        assert!(text.starts_with("[route_with_warning] Routing to Market Overview"));
        assert!(text.contains("endpoint: /market-overview (0.61)"));
        assert!(text.contains("- Name a region"));
        assert!(text.contains("alt: /data-exploration (0.42) data exploration"));
    }
}
