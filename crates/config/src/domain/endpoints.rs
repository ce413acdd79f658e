//! Endpoint specifications

use geo_router_core::{BaseIntent, EndpointId, FieldName};
use std::collections::BTreeSet;

/// Default per-endpoint routing threshold
pub const DEFAULT_ENDPOINT_THRESHOLD: f64 = 0.5;

/// Validated endpoint mapping
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSpec {
    pub id: EndpointId,
    pub display_name: String,
    pub description: String,
    pub primary_intents: BTreeSet<BaseIntent>,
    pub required_fields: BTreeSet<FieldName>,
    pub boost_terms: BTreeSet<String>,
    pub penalty_terms: BTreeSet<String>,
    /// Minimum confidence for a plain `route` (0.0 - 1.0)
    pub confidence_threshold: f64,
}

impl EndpointSpec {
    /// Whether any primary intent is in `intents`
    pub fn serves_any(&self, intents: &[BaseIntent]) -> bool {
        intents.iter().any(|i| self.primary_intents.contains(i))
    }

    /// Display name derived from the id when none is configured
    pub(crate) fn default_display_name(id: &EndpointId) -> String {
        id.as_phrase()
            .split_whitespace()
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_display_name() {
        let id = EndpointId::parse("/competitive-analysis").unwrap();
        assert_eq!(EndpointSpec::default_display_name(&id), "Competitive Analysis");
    }
}
