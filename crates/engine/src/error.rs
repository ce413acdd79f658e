//! Engine errors

use thiserror::Error;

use geo_router_config::ConfigError;
use geo_router_core::RouterError;
use geo_router_text_processing::TextProcessingError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Text processing error: {0}")]
    TextProcessing(#[from] TextProcessingError),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error("Invalid engine settings: {0}")]
    InvalidSettings(String),
}

impl EngineError {
    /// Whether the error only affects the request that raised it
    pub fn is_request_scoped(&self) -> bool {
        matches!(self, Self::Router(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
