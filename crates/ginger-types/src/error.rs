//! Validation and configuration errors

use thiserror::Error;

/// Local validation failures, raised before any remote call is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Memory size {0} MB is invalid: must be at least 128 and a multiple of 64")]
    InvalidMemorySize(u32),

    #[error("Timeout {0}s is invalid: must be between 1 and 900")]
    InvalidTimeout(u32),

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("Invalid name '{name}': only alphanumerics, '-' and '_' are allowed")]
    InvalidName { name: String },

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Unsupported event source: {0}")]
    UnsupportedEventSource(String),
}

/// A required setting is missing for one unit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Function '{function}' has no execution role and the project has no default role")]
    MissingExecutionRole { function: String },

    #[error("Project setting '{0}' is not configured")]
    MissingSetting(&'static str),
}
