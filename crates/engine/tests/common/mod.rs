//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use geo_router_config::DomainConfiguration;
use geo_router_core::{Category, DatasetContext, FieldCharacteristics, FieldName};
use geo_router_engine::HybridRoutingEngine;

pub const RETAIL: &str = include_str!("../fixtures/retail.yaml");

pub const COMPETITIVE_QUERY: &str = "Show me the top 10 areas by competitive advantage score";
pub const WEATHER_QUERY: &str = "What's the weather forecast for tomorrow?";
pub const VAGUE_QUERY: &str = "Analyze the market";

pub fn retail() -> DomainConfiguration {
    DomainConfiguration::from_yaml_str(RETAIL).unwrap()
}

pub fn engine() -> HybridRoutingEngine {
    HybridRoutingEngine::with_defaults(retail()).unwrap()
}

pub fn field(name: &str) -> FieldName {
    FieldName::parse(name).unwrap()
}

/// Every field the retail endpoints require, fully populated
pub fn full_dataset() -> DatasetContext {
    let competition = Category::parse("competition").unwrap();
    let demographics = Category::parse("demographics").unwrap();
    DatasetContext::new()
        .with_field(competition.clone(), field("competitor_count"), FieldCharacteristics::complete())
        .with_field(competition, field("market_share"), FieldCharacteristics::complete())
        .with_field(demographics.clone(), field("population"), FieldCharacteristics::complete())
        .with_field(demographics, field("median_income"), FieldCharacteristics::complete())
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
