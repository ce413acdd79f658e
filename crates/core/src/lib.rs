//! Core types and traits for the hybrid query routing engine
//!
//! This crate provides foundational types used across all other crates:
//! - Validated identifiers (endpoint ids, field names, categories)
//! - Base intents and ranked classification output
//! - Dataset metadata snapshot and routing history
//! - Endpoint candidates, validation and routing results
//! - Error types
//! - Collaborator traits (dataset provider, feedback sink, renderer)

pub mod candidate;
pub mod dataset;
pub mod error;
pub mod history;
pub mod ids;
pub mod intent;
pub mod routing;
pub mod traits;
pub mod validation;

pub use candidate::{
    sort_candidates, EndpointCandidate, Enhancement, EnhancementKind, Penalty, PenaltyKind,
};
pub use dataset::{DatasetContext, DatasetRecord, FieldCharacteristics, FieldValue};
pub use error::{Result, RouterError};
pub use history::{HistoryEntry, HistoryMatch, OutcomeCounts, QueryPattern, RoutingHistory};
pub use ids::{Category, EndpointId, FieldName, IdError};
pub use intent::{BaseIntent, CategoryMatch, IntentScore, RankedIntents, SignatureCategory};
pub use routing::{
    IntentSummary, ResponseKind, RoutingAction, RoutingRecommendation,
    RoutingResult, RoutingStage, UserResponse,
};
pub use validation::{QueryScope, ValidationResult};

pub use traits::{
    DatasetProvider, FeedbackRecord, FeedbackSink, PlainTextRenderer, ResponseRenderer,
    StaticDatasetProvider,
};
