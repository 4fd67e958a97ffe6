//! Notification configuration

use serde::{Deserialize, Serialize};

use crate::error::{NotificationError, NotificationResult};

/// Configuration for email delivery of pass reports.
#[derive(Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Whether email notifications are enabled.
    #[serde(default)]
    pub enabled: bool,

    /// SMTP host.
    #[serde(default)]
    pub smtp_host: Option<String>,

    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Upgrade with STARTTLS; otherwise connect with implicit TLS.
    #[serde(default = "default_true")]
    pub starttls: bool,

    /// SMTP username. No authentication when absent.
    #[serde(default)]
    pub smtp_username: Option<String>,

    /// SMTP password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_password: Option<String>,

    /// From email address.
    #[serde(default)]
    pub from_email: Option<String>,

    /// From name.
    #[serde(default = "default_from_name")]
    pub from_name: Option<String>,

    /// Recipient addresses.
    #[serde(default)]
    pub to: Vec<String>,

    /// Prefix prepended to every subject line.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

fn default_from_name() -> Option<String> {
    Some("Dormant".to_string())
}

fn default_subject_prefix() -> String {
    "[dormant]".to_string()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: None,
            smtp_port: default_smtp_port(),
            starttls: true,
            smtp_username: None,
            smtp_password: None,
            from_email: None,
            from_name: default_from_name(),
            to: Vec::new(),
            subject_prefix: default_subject_prefix(),
        }
    }
}

impl std::fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("enabled", &self.enabled)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("starttls", &self.starttls)
            .field("smtp_username", &self.smtp_username)
            .field(
                "smtp_password",
                &self.smtp_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("to", &self.to)
            .field("subject_prefix", &self.subject_prefix)
            .finish()
    }
}

impl NotificationConfig {
    /// Check that everything needed to send is present. A disabled
    /// configuration is always valid.
    pub fn validate(&self) -> NotificationResult<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.smtp_host.as_deref().map_or(true, str::is_empty) {
            return Err(NotificationError::ConfigurationError(
                "SMTP host not configured".to_string(),
            ));
        }

        if self.from_email.as_deref().map_or(true, str::is_empty) {
            return Err(NotificationError::ConfigurationError(
                "From email not configured".to_string(),
            ));
        }

        if self.to.is_empty() {
            return Err(NotificationError::ConfigurationError(
                "No recipients configured".to_string(),
            ));
        }

        if self.smtp_username.is_some() && self.smtp_password.is_none() {
            return Err(NotificationError::ConfigurationError(
                "smtp_password is required when smtp_username is set".to_string(),
            ));
        }

        Ok(())
    }
}
