//! Lifecycle error types
//!
//! Error definitions with fatal/recoverable classification. Fatal errors abort
//! a pass before any directory mutation; recoverable errors are attached to
//! the pass result as diagnostics.

use thiserror::Error;

/// Error that can occur while running a lifecycle pass.
#[derive(Debug, Error)]
pub enum LifecycleError {
    // Configuration errors (fatal)
    /// Configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// An exemption pattern could not be compiled.
    #[error("invalid exemption pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The holding location does not exist in the directory.
    #[error("holding location '{name}' not found")]
    HoldingLocationNotFound { name: String },

    /// The holding location name matched more than one container.
    #[error("holding location '{name}' is ambiguous: {matches} containers match")]
    HoldingLocationAmbiguous { name: String, matches: usize },

    // Directory errors
    /// Failed to establish or bind a directory connection.
    #[error("directory connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Bind credentials were rejected.
    #[error("directory authentication failed: invalid credentials")]
    AuthenticationFailed,

    /// The bound principal may not perform the operation.
    #[error("insufficient access for {operation} on {identifier}")]
    InsufficientAccess {
        operation: String,
        identifier: String,
    },

    /// Object not found in the directory.
    #[error("object not found: {identifier}")]
    ObjectNotFound { identifier: String },

    /// The directory rejected or failed an operation.
    #[error("directory operation failed: {message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A directory value could not be interpreted.
    #[error("invalid data: {message}")]
    InvalidData { message: String },

    // Reporting errors
    /// A report sink failed to deliver a pass result.
    #[error("report delivery failed via {sink}: {message}")]
    ReportDelivery { sink: String, message: String },
}

impl LifecycleError {
    /// Whether this error must abort the pass.
    ///
    /// Mutation-level errors are recoverable: the executor records them and
    /// moves on to the next account.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LifecycleError::InvalidConfiguration { .. }
                | LifecycleError::InvalidPattern { .. }
                | LifecycleError::HoldingLocationNotFound { .. }
                | LifecycleError::HoldingLocationAmbiguous { .. }
                | LifecycleError::ConnectionFailed { .. }
                | LifecycleError::AuthenticationFailed
        )
    }

    /// Whether this error stems from configuration rather than the directory.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LifecycleError::InvalidConfiguration { .. }
                | LifecycleError::InvalidPattern { .. }
                | LifecycleError::HoldingLocationNotFound { .. }
                | LifecycleError::HoldingLocationAmbiguous { .. }
        )
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            LifecycleError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            LifecycleError::InvalidPattern { .. } => "INVALID_PATTERN",
            LifecycleError::HoldingLocationNotFound { .. } => "HOLDING_NOT_FOUND",
            LifecycleError::HoldingLocationAmbiguous { .. } => "HOLDING_AMBIGUOUS",
            LifecycleError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            LifecycleError::AuthenticationFailed => "AUTH_FAILED",
            LifecycleError::InsufficientAccess { .. } => "INSUFFICIENT_ACCESS",
            LifecycleError::ObjectNotFound { .. } => "OBJECT_NOT_FOUND",
            LifecycleError::OperationFailed { .. } => "OPERATION_FAILED",
            LifecycleError::InvalidData { .. } => "INVALID_DATA",
            LifecycleError::ReportDelivery { .. } => "REPORT_DELIVERY_FAILED",
        }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        LifecycleError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with a source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        LifecycleError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an operation failed error.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        LifecycleError::OperationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create an operation failed error with a source.
    pub fn operation_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        LifecycleError::OperationFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        LifecycleError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holding_errors_are_fatal_configuration() {
        let not_found = LifecycleError::HoldingLocationNotFound {
            name: "Stale".to_string(),
        };
        let ambiguous = LifecycleError::HoldingLocationAmbiguous {
            name: "Stale".to_string(),
            matches: 2,
        };

        assert!(not_found.is_fatal());
        assert!(not_found.is_configuration());
        assert!(ambiguous.is_fatal());
        assert!(ambiguous.is_configuration());
        assert_eq!(ambiguous.error_code(), "HOLDING_AMBIGUOUS");
    }

    #[test]
    fn test_mutation_errors_are_recoverable() {
        let err = LifecycleError::operation_failed("modify rejected");
        assert!(!err.is_fatal());
        assert!(!err.is_configuration());

        let err = LifecycleError::ObjectNotFound {
            identifier: "CN=PC01,DC=example,DC=com".to_string(),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.error_code(), "OBJECT_NOT_FOUND");
    }

    #[test]
    fn test_connection_errors_are_fatal_but_not_configuration() {
        let err = LifecycleError::connection_failed("dc01 unreachable");
        assert!(err.is_fatal());
        assert!(!err.is_configuration());
        assert!(LifecycleError::AuthenticationFailed.is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = LifecycleError::HoldingLocationAmbiguous {
            name: "Stale Computers".to_string(),
            matches: 3,
        };
        assert_eq!(
            err.to_string(),
            "holding location 'Stale Computers' is ambiguous: 3 containers match"
        );

        let err = LifecycleError::InvalidPattern {
            pattern: "[".to_string(),
            message: "unclosed".to_string(),
        };
        assert!(err.to_string().contains("invalid exemption pattern '['"));
    }

    #[test]
    fn test_error_with_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = LifecycleError::connection_failed_with_source("bind failed", io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
