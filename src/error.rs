//! Error types for calendar generation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generator request failed: {0}")]
    Request(String),

    #[error("generator API error: {0}")]
    Api(String),

    #[error("generator response could not be parsed: {0}")]
    Unparseable(String),

    #[error("generator returned empty content")]
    Empty,
}

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("content generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("invalid thread: {0}")]
    InvalidThread(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T, E = CalendarError> = std::result::Result<T, E>;
