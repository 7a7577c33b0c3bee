//! Error types for the store module.

use certcascade_core::FailureReason;
use thiserror::Error;

/// Errors returned by store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Credential does not exist.
    #[error("credential not found: {0}")]
    NotFound(String),

    /// Caller is not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Credential type does not support regeneration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Server answered with something we could not interpret.
    #[error("unexpected response: {0}")]
    Protocol(String),

    /// Client could not be constructed.
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// Map onto the node-level failure taxonomy.
    pub fn reason(&self) -> FailureReason {
        match self {
            StoreError::NotFound(_) => FailureReason::NotFound,
            StoreError::PermissionDenied(_) => FailureReason::PermissionDenied,
            StoreError::Timeout(_) => FailureReason::Timeout,
            StoreError::Validation(_) => FailureReason::ValidationError,
            StoreError::Network(_) | StoreError::Protocol(_) | StoreError::InvalidConfig(_) => {
                FailureReason::NetworkError
            }
        }
    }

    /// Whether an idempotent call failing with this error may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Network(_) | StoreError::Timeout(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_mapping() {
        assert_eq!(StoreError::NotFound("x".into()).reason(), FailureReason::NotFound);
        assert_eq!(
            StoreError::PermissionDenied("x".into()).reason(),
            FailureReason::PermissionDenied
        );
        assert_eq!(StoreError::Network("x".into()).reason(), FailureReason::NetworkError);
        assert_eq!(StoreError::Protocol("x".into()).reason(), FailureReason::NetworkError);
        assert_eq!(StoreError::Timeout("x".into()).reason(), FailureReason::Timeout);
        assert_eq!(
            StoreError::Validation("x".into()).reason(),
            FailureReason::ValidationError
        );
    }

    #[test]
    fn test_only_network_and_timeout_are_transient() {
        assert!(StoreError::Network("x".into()).is_transient());
        assert!(StoreError::Timeout("x".into()).is_transient());
        assert!(!StoreError::NotFound("x".into()).is_transient());
        assert!(!StoreError::PermissionDenied("x".into()).is_transient());
        assert!(!StoreError::Validation("x".into()).is_transient());
        assert!(!StoreError::Protocol("x".into()).is_transient());
    }
}
