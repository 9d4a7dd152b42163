//! Deployment error types

use ginger_gateway::GatewayError;
use ginger_store::StoreError;
use ginger_types::{ConfigurationError, ValidationError};
use std::path::PathBuf;
use thiserror::Error;

/// Hard errors: each one aborts the phase that raised it
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Pre-deploy hook '{command}' exited with {status}: {stderr}")]
    HookFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to run pre-deploy hook '{command}': {source}")]
    HookLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Local state error: {0}")]
    Store(#[from] StoreError),

    #[error("{entity}: {source}")]
    Remote {
        entity: String,
        #[source]
        source: GatewayError,
    },

    #[error("Routing container {0} has no root resource")]
    MissingRoot(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation cancelled by user")]
    Cancelled,
}

impl DeployError {
    pub(crate) fn remote(entity: impl Into<String>, source: GatewayError) -> Self {
        DeployError::Remote {
            entity: entity.into(),
            source,
        }
    }
}

/// Result type for deployment operations
pub type Result<T> = std::result::Result<T, DeployError>;
