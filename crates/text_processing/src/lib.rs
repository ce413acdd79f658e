//! Query text processing for the hybrid routing engine
//!
//! This crate provides the domain-agnostic front half of routing:
//! - **Tokenization**: unicode words, stopword removal, light stemming
//! - **Intent Classification**: scores the fourteen base intents from a static signature table
//! - **Scope Validation**: decides whether a query belongs to the active domain
//!
//! # Example
//!
//! ```ignore
//! use geo_router_text_processing::{BaseIntentClassifier, QueryValidator, Tokenizer};
//!
//! let validation = QueryValidator::default().validate(query, &domain);
//! let tokens = Tokenizer::new().tokenize(query);
//! let ranked = BaseIntentClassifier::new().classify(&tokens.tokens);
//! ```

pub mod intent;
pub mod tokenizer;
pub mod validator;

mod error;

pub use error::{Result, TextProcessingError};
pub use intent::{BaseIntentClassifier, MULTI_CATEGORY_BONUS};
pub use tokenizer::{is_stopword, stem, stem_phrase, TokenizedQuery, Tokenizer};
pub use validator::{domain_relevance, QueryValidator};
