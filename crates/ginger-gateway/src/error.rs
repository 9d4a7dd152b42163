//! Normalized provider errors

use thiserror::Error;

/// Provider failures, normalized across services.
///
/// `NotFound` is a confirmed absence. `Throttled` and `Unavailable` mean the
/// outcome could not be determined and must never be read as absence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("{service}.{operation}: {target} not found")]
    NotFound {
        service: &'static str,
        operation: &'static str,
        target: String,
    },

    #[error("{service}.{operation}: {target} already exists")]
    AlreadyExists {
        service: &'static str,
        operation: &'static str,
        target: String,
    },

    #[error("{service}.{operation}: throttled: {message}")]
    Throttled {
        service: &'static str,
        operation: &'static str,
        message: String,
    },

    #[error("{service}.{operation}: service unavailable: {message}")]
    Unavailable {
        service: &'static str,
        operation: &'static str,
        message: String,
    },

    #[error("{service}.{operation}: {code}: {message}")]
    Rejected {
        service: &'static str,
        operation: &'static str,
        code: String,
        message: String,
    },
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, GatewayError::AlreadyExists { .. })
    }

    /// Retrying later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::Throttled { .. } | GatewayError::Unavailable { .. }
        )
    }

    pub fn operation(&self) -> &'static str {
        match self {
            GatewayError::NotFound { operation, .. }
            | GatewayError::AlreadyExists { operation, .. }
            | GatewayError::Throttled { operation, .. }
            | GatewayError::Unavailable { operation, .. }
            | GatewayError::Rejected { operation, .. } => operation,
        }
    }
}

/// Result type for gateway calls
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let throttled = GatewayError::Throttled {
            service: "routing",
            operation: "get_resource",
            message: "slow down".into(),
        };
        assert!(throttled.is_transient());
        assert!(!throttled.is_not_found());
        assert_eq!(throttled.operation(), "get_resource");

        let missing = GatewayError::NotFound {
            service: "compute",
            operation: "get_function",
            target: "hello".into(),
        };
        assert!(missing.is_not_found());
        assert!(!missing.is_transient());
        assert_eq!(missing.to_string(), "compute.get_function: hello not found");
    }
}
