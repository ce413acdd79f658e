//! Router errors
//!
//! Rejections and low-confidence fallbacks are normal outcomes carried on
//! `RoutingResult`; only broken internal invariants surface as errors.

use thiserror::Error;

use crate::ids::IdError;

/// Errors that abort a single routing request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouterError {
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Invalid identifier: {0}")]
    Identifier(#[from] IdError),

    #[error("Dataset provider error: {0}")]
    Dataset(String),
}

pub type Result<T> = std::result::Result<T, RouterError>;
