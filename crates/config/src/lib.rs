//! Configuration management for the hybrid query routing engine
//!
//! Supports loading configuration from:
//! - YAML/JSON domain documents (one per business vertical)
//! - TOML/YAML settings files
//! - Environment variables (GEO_ROUTER_ prefix)
//!
//! # Domain Configuration
//!
//! Domain documents live in config/domains/{domain}/domain.yaml and may be
//! layered over config/base/defaults.yaml. A document is parsed, validated
//! and compiled into an immutable `DomainConfiguration`; adding an endpoint
//! is a document change only.

pub mod domain;
pub mod settings;

pub use domain::{
    merge_json, CompiledRejectionPattern, ConfigLint, DomainConfiguration, DomainDocument,
    DomainIndicators, DomainTerms, DomainValidator, DomainVocabulary, EndpointDocument,
    EndpointSpec, LintKind, TermMatcher, TopicRedirect, ValidationRules,
};
pub use settings::{
    load_settings, load_settings_from, AdapterSettings, ContextSettings, DecompositionSettings,
    DomainSettings, LoggingSettings, RouterSettings, RuntimeEnvironment, ThresholdSettings,
    TuningSettings, ValidatorSettings,
};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Value out of range for {field}: {value} (expected {expected})")]
    InvalidRange {
        field: String,
        value: f64,
        expected: String,
    },

    #[error("Duplicate endpoint: {0}")]
    DuplicateEndpoint(String),

    #[error("Synonym cycle longer than {bound}: {}", cycle.join(" -> "))]
    CyclicSynonym { cycle: Vec<String>, bound: usize },

    #[error("Unknown intent '{intent}' on endpoint {endpoint}")]
    UnknownIntent { endpoint: String, intent: String },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Endpoint {endpoint} lists itself in its avoid terms ('{term}')")]
    SelfAvoidance { endpoint: String, term: String },

    #[error("Avoid terms reference unknown endpoint: {0}")]
    UnknownEndpointReference(String),

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<geo_router_core::IdError> for ConfigError {
    fn from(err: geo_router_core::IdError) -> Self {
        ConfigError::InvalidIdentifier(err.to_string())
    }
}
