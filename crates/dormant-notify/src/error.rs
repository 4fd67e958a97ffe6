//! Notification errors

use thiserror::Error;

use dormant_core::error::LifecycleError;

/// Errors that can occur while rendering or delivering a report.
#[derive(Error, Debug)]
pub enum NotificationError {
    /// SMTP or sink configuration error.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Failed to send email.
    #[error("failed to send email: {0}")]
    SendFailed(String),

    /// Template registration or rendering error.
    #[error("template error: {0}")]
    TemplateError(String),

    /// Failed to write a report file.
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the pass result.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NotificationError {
    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            NotificationError::ConfigurationError(_) => "NOTIFY_CONFIG",
            NotificationError::SendFailed(_) => "NOTIFY_SEND_FAILED",
            NotificationError::TemplateError(_) => "NOTIFY_TEMPLATE",
            NotificationError::Io { .. } => "NOTIFY_IO",
            NotificationError::Serialization(_) => "NOTIFY_SERIALIZATION",
        }
    }

    /// Wrap as a report delivery failure of `sink`.
    pub fn into_delivery_error(self, sink: &str) -> LifecycleError {
        LifecycleError::ReportDelivery {
            sink: sink.to_string(),
            message: self.to_string(),
        }
    }
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(e: handlebars::RenderError) -> Self {
        NotificationError::TemplateError(e.to_string())
    }
}

impl From<handlebars::TemplateError> for NotificationError {
    fn from(e: handlebars::TemplateError) -> Self {
        NotificationError::TemplateError(e.to_string())
    }
}

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;
