//! Error types for the runtime client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Container runtime unavailable: {0}")]
    Unavailable(String),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("{command} failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("Failed to parse runtime output: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
