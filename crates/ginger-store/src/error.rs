//! Store error types

use ginger_types::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing local state
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No Ginger.toml found in {0} or any parent directory")]
    ProjectNotFound(PathBuf),

    #[error("Project already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to encode state: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource already defined: {0}")]
    ResourceExists(String),

    #[error("Resource path {0} appears more than once")]
    DuplicateResource(String),

    #[error("No {method} integration on {path}")]
    IntegrationNotFound { path: String, method: String },

    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Function already defined: {0}")]
    FunctionExists(String),

    #[error("{kind} not found: {name}")]
    DefinitionNotFound { kind: &'static str, name: String },

    #[error("{kind} already defined: {name}")]
    DefinitionExists { kind: &'static str, name: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
