//! Provider error classification

use crate::error::GatewayError;
use aws_sdk_sts::error::{ProvideErrorMetadata, SdkError};

/// Fold an SDK error into a [`GatewayError`] by its provider error code
pub(crate) fn classify<E, R>(
    service: &'static str,
    operation: &'static str,
    target: &str,
    err: SdkError<E, R>,
) -> GatewayError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if matches!(
        err,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_)
    ) {
        return GatewayError::Unavailable {
            service,
            operation,
            message: err.to_string(),
        };
    }

    let code = err.code().unwrap_or("Unknown").to_string();
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());

    match code.as_str() {
        "NotFoundException" | "ResourceNotFoundException" | "NotFound" | "NoSuchBucket"
        | "NoSuchEntity" => GatewayError::NotFound {
            service,
            operation,
            target: target.to_string(),
        },
        "ConflictException" | "ResourceConflictException" | "BucketAlreadyExists"
        | "ResourceAlreadyExistsException" => GatewayError::AlreadyExists {
            service,
            operation,
            target: target.to_string(),
        },
        "TooManyRequestsException" | "ThrottlingException" | "Throttling" | "SlowDown"
        | "LimitExceededException" => GatewayError::Throttled {
            service,
            operation,
            message,
        },
        "ServiceUnavailableException" | "ServiceException" | "InternalFailure"
        | "InternalServerError" | "InternalException" => GatewayError::Unavailable {
            service,
            operation,
            message,
        },
        _ => GatewayError::Rejected {
            service,
            operation,
            code,
            message,
        },
    }
}

/// Provider response without a field the API guarantees
pub(crate) fn missing_field(service: &'static str, operation: &'static str, field: &str) -> GatewayError {
    GatewayError::Rejected {
        service,
        operation,
        code: "MissingField".into(),
        message: format!("response did not include {}", field),
    }
}
