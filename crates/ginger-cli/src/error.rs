//! CLI error types

use ginger_deploy::DeployError;
use ginger_store::StoreError;
use ginger_types::ValidationError;
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local state error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Deployment error
    #[error(transparent)]
    Deploy(#[from] DeployError),

    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
