//! Compound query splitting
//!
//! A compound query is split on configured connectors and every segment is
//! routed on its own. Segments never share state or influence each other.

use regex::Regex;

use geo_router_config::DecompositionSettings;

use crate::{EngineError, Result};

#[derive(Debug, Clone)]
pub struct QueryDecomposer {
    splitter: Option<Regex>,
    max_segments: usize,
}

impl QueryDecomposer {
    pub fn new(settings: &DecompositionSettings) -> Result<Self> {
        let mut connectors: Vec<&String> = settings
            .connectors
            .iter()
            .filter(|c| !c.trim().is_empty())
            .collect();
        connectors.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let connectors: Vec<String> = connectors.into_iter().map(|c| regex::escape(c)).collect();

        let splitter = if settings.enabled && !connectors.is_empty() {
            let pattern = format!("(?i){}", connectors.join("|"));
            Some(Regex::new(&pattern).map_err(|e| {
                EngineError::InvalidSettings(format!("decomposition.connectors: {}", e))
            })?)
        } else {
            None
        };

        Ok(Self {
            splitter,
            max_segments: settings.max_segments.max(1),
        })
    }

    /// Non-empty trimmed segments; the whole query when nothing splits
    pub fn split<'a>(&self, query: &'a str) -> Vec<&'a str> {
        let segments: Vec<&str> = match &self.splitter {
            Some(re) => re
                .splitn(query, self.max_segments)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect(),
            None => Vec::new(),
        };

        if segments.is_empty() {
            vec![query.trim()]
        } else {
            segments
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decomposer() -> QueryDecomposer {
        QueryDecomposer::new(&DecompositionSettings::default()).unwrap()
    }

    #[test]
    fn test_split_on_connectors() {
        let segments = decomposer()
            .split("Show demographics by area and then rank stores by sales; compare competitors");
        assert_eq!(
            segments,
            vec!["Show demographics by area", "rank stores by sales", "compare competitors"]
        );
    }

    #[test]
    fn test_single_segment() {
        assert_eq!(decomposer().split("  Analyze the market "), vec!["Analyze the market"]);
    }

    #[test]
    fn test_max_segments() {
        let settings = DecompositionSettings {
            max_segments: 2,
            ..Default::default()
        };
        let segments = QueryDecomposer::new(&settings).unwrap().split("a; b; c");
        assert_eq!(segments, vec!["a", "b; c"]);
    }

    #[test]
    fn test_disabled() {
        let settings = DecompositionSettings {
            enabled: false,
            ..Default::default()
        };
        let segments = QueryDecomposer::new(&settings).unwrap().split("a; b");
        assert_eq!(segments, vec!["a; b"]);
    }
}
