//! Hybrid query routing engine
//!
//! Routes a natural-language analytics query to the best analysis endpoint
//! of the active business domain, or explains why it cannot:
//!
//! - **Validator**: scope check before any routing work
//! - **Base intents**: domain-agnostic intent ranking
//! - **Vocabulary adapter**: domain terms, synonyms, boost/penalty/avoid terms
//! - **Context enhancer**: dataset field availability, history, data quality
//! - **Confidence manager**: threshold table and feedback-driven tuning
//!
//! # Example
//!
//! ```ignore
//! use geo_router_config::DomainConfiguration;
//! use geo_router_core::DatasetContext;
//! use geo_router_engine::HybridRoutingEngine;
//!
//! let domain = DomainConfiguration::load_file("config/domains/retail/domain.yaml")?;
//! let engine = HybridRoutingEngine::with_defaults(domain)?;
//! let dataset = engine.bind_dataset(DatasetContext::new());
//!
//! let result = engine.route("Show me the top 10 areas by competitive advantage score", &dataset)?;
//! println!("{} -> {:?}", result.action, result.endpoint);
//! ```

pub mod adapter;
pub mod compound;
pub mod confidence;
pub mod context;
pub mod engine;
pub mod feedback;

mod error;

pub use adapter::{EnhancedQuery, IndexedTerm, VocabularyAdapter, VocabularyIndex};
pub use compound::QueryDecomposer;
pub use confidence::{ConfidenceManager, ConfidenceThresholds, ThresholdUpdate, TuningDirection};
pub use context::{ContextAdjustment, ContextEnhancer};
pub use engine::{ActiveDomain, HybridRoutingEngine};
pub use error::{EngineError, Result};
pub use feedback::FeedbackBuffer;
