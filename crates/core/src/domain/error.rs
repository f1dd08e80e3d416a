// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Sentiment score out of range (0..=4): {0}")]
    InvalidSentiment(i64),

    #[error("Unknown entity label: {0}")]
    UnknownEntityLabel(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
