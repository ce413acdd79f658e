//! Text processing errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TextProcessingError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Configuration error: {0}")]
    Config(#[from] geo_router_config::ConfigError),
}

pub type Result<T> = std::result::Result<T, TextProcessingError>;
