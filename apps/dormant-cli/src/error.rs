//! CLI error types and exit codes

use thiserror::Error;

use dormant_core::LifecycleError;
use dormant_notify::NotificationError;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 2: Configuration error
/// - 3: Directory connectivity error
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read {path}: {message}")]
    ConfigFile { path: String, message: String },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Notification(#[from] NotificationError),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::ConfigFile { .. } => 2,
            CliError::Lifecycle(e) if e.is_configuration() => 2,
            CliError::Lifecycle(
                LifecycleError::ConnectionFailed { .. } | LifecycleError::AuthenticationFailed,
            ) => 3,
            CliError::Lifecycle(_) => 1,
            CliError::Notification(NotificationError::ConfigurationError(_)) => 2,
            CliError::Notification(_) => 1,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::Lifecycle(LifecycleError::HoldingLocationAmbiguous { .. }) => {
                Some("Set lifecycle.holding_location to the full distinguished name.")
            }
            CliError::Lifecycle(LifecycleError::HoldingLocationNotFound { .. }) => {
                Some("Run 'dormant check' to verify the holding location exists.")
            }
            CliError::Lifecycle(LifecycleError::AuthenticationFailed) => {
                Some("Check directory.bind_dn and DORMANT_BIND_PASSWORD.")
            }
            CliError::Lifecycle(LifecycleError::ConnectionFailed { .. }) => {
                Some("Check directory.host, port and TLS settings.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Config("missing".to_string()).exit_code(), 2);
        assert_eq!(
            CliError::from(LifecycleError::HoldingLocationAmbiguous {
                name: "Stale".to_string(),
                matches: 2,
            })
            .exit_code(),
            2
        );
        assert_eq!(
            CliError::from(LifecycleError::connection_failed("refused")).exit_code(),
            3
        );
        assert_eq!(
            CliError::from(LifecycleError::AuthenticationFailed).exit_code(),
            3
        );
        assert_eq!(
            CliError::from(LifecycleError::operation_failed("boom")).exit_code(),
            1
        );
        assert_eq!(
            CliError::from(NotificationError::SendFailed("x".to_string())).exit_code(),
            1
        );
    }

    #[test]
    fn test_suggestion_for_ambiguous_holding() {
        let err = CliError::from(LifecycleError::HoldingLocationAmbiguous {
            name: "Stale".to_string(),
            matches: 2,
        });
        assert!(err.suggestion().is_some());
        assert!(CliError::Config("x".to_string()).suggestion().is_none());
    }
}
