//! Error types for the BitLaunch provider.

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur while serving a provider operation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The API rejected the token.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The API rate limit was hit.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The API is temporarily unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// An operation did not finish in time.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// The resource is not in a state that allows the operation.
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// Operation not implemented for this resource type.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
}

impl ProviderError {
    /// Get the error message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Internal(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::PermissionDenied(msg)
            | Self::ResourceExhausted(msg)
            | Self::Unavailable(msg)
            | Self::DeadlineExceeded(msg)
            | Self::FailedPrecondition(msg)
            | Self::Unimplemented(msg) => msg,
            Self::Serialization(_) => "serialization error (see Debug output)",
        }
    }
}

impl From<ApiError> for ProviderError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(msg) => Self::NotFound(msg),
            ApiError::Status { status, message } => match status {
                401 | 403 => Self::PermissionDenied(message),
                404 => Self::NotFound(message),
                429 => Self::ResourceExhausted(message),
                500..=599 => Self::Unavailable(format!("{} ({})", message, status)),
                _ => Self::Internal(format!("API returned {}: {}", status, message)),
            },
            ApiError::Http(e) if e.is_timeout() => Self::DeadlineExceeded(e.to_string()),
            ApiError::Http(e) if e.is_connect() => Self::Unavailable(e.to_string()),
            ApiError::Http(e) => Self::Internal(e.to_string()),
            ApiError::Decode(e) => Self::Serialization(e),
            ApiError::InvalidEndpoint(msg) => Self::Configuration(msg),
        }
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(msg) => tonic::Status::not_found(msg),
            ProviderError::Validation(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::UnknownResource(msg) => tonic::Status::not_found(msg),
            ProviderError::Internal(msg) => tonic::Status::internal(msg),
            ProviderError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            },
            ProviderError::PermissionDenied(msg) => tonic::Status::permission_denied(msg),
            ProviderError::ResourceExhausted(msg) => tonic::Status::resource_exhausted(msg),
            ProviderError::Unavailable(msg) => tonic::Status::unavailable(msg),
            ProviderError::DeadlineExceeded(msg) => tonic::Status::deadline_exceeded(msg),
            ProviderError::FailedPrecondition(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::Unimplemented(msg) => tonic::Status::unimplemented(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("ssh key abc".to_string());
        assert_eq!(format!("{}", err), "Resource not found: ssh key abc");

        let err = ProviderError::DeadlineExceeded("timed out getting IPv4 address".to_string());
        assert_eq!(
            format!("{}", err),
            "Deadline exceeded: timed out getting IPv4 address"
        );

        let err = ProviderError::UnknownResource("bitlaunch_volume".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: bitlaunch_volume");
    }

    #[test]
    fn test_error_to_status() {
        let status: tonic::Status = ProviderError::NotFound("x".to_string()).into();
        assert_eq!(status.code(), tonic::Code::NotFound);

        let status: tonic::Status = ProviderError::Validation("x".to_string()).into();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);

        let status: tonic::Status = ProviderError::Configuration("x".to_string()).into();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);

        let status: tonic::Status = ProviderError::PermissionDenied("x".to_string()).into();
        assert_eq!(status.code(), tonic::Code::PermissionDenied);

        let status: tonic::Status = ProviderError::DeadlineExceeded("x".to_string()).into();
        assert_eq!(status.code(), tonic::Code::DeadlineExceeded);

        let status: tonic::Status = ProviderError::Unimplemented("x".to_string()).into();
        assert_eq!(status.code(), tonic::Code::Unimplemented);
    }

    #[test]
    fn test_api_status_mapping() {
        let status = |code: u16| ApiError::Status {
            status: code,
            message: "nope".to_string(),
        };

        assert!(matches!(
            ProviderError::from(status(401)),
            ProviderError::PermissionDenied(_)
        ));
        assert!(matches!(
            ProviderError::from(status(403)),
            ProviderError::PermissionDenied(_)
        ));
        assert!(matches!(
            ProviderError::from(status(429)),
            ProviderError::ResourceExhausted(_)
        ));
        assert!(matches!(
            ProviderError::from(status(502)),
            ProviderError::Unavailable(_)
        ));
        assert!(matches!(
            ProviderError::from(status(400)),
            ProviderError::Internal(_)
        ));
        assert!(matches!(
            ProviderError::from(ApiError::NotFound("gone".to_string())),
            ProviderError::NotFound(_)
        ));
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::Configuration("missing token".to_string());
        assert_eq!(err.message(), "missing token");

        let err = ProviderError::FailedPrecondition("server stopped".to_string());
        assert_eq!(err.message(), "server stopped");
    }
}
