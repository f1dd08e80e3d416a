// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Collaborator failures inside an iteration are reported as outcomes, not
/// errors; only queue transport and configuration problems surface here.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Queue error: {0}")]
    Queue(#[from] crate::port::QueueError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
