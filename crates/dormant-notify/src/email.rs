//! SMTP delivery of pass reports

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, instrument};

use dormant_core::error::LifecycleResult;
use dormant_core::report::{PassResult, ReportSink};

use crate::config::NotificationConfig;
use crate::error::{NotificationError, NotificationResult};
use crate::render::{subject, ReportRenderer};

/// Sends pass reports as multipart (plain text + HTML) email.
pub struct EmailNotifier {
    config: NotificationConfig,
    renderer: Arc<ReportRenderer>,
}

impl EmailNotifier {
    /// Create a notifier. The configuration is validated up front.
    pub fn new(config: NotificationConfig, renderer: Arc<ReportRenderer>) -> NotificationResult<Self> {
        config.validate()?;
        Ok(Self { config, renderer })
    }

    /// Check if notifications are enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn mailbox(address: &str, name: Option<&str>) -> NotificationResult<Mailbox> {
        let mut mailbox: Mailbox = address.parse().map_err(|e| {
            NotificationError::ConfigurationError(format!("Invalid email address '{}': {}", address, e))
        })?;
        if let Some(name) = name {
            mailbox.name = Some(name.to_string());
        }
        Ok(mailbox)
    }

    /// Build the message for `result` without sending it.
    pub fn build_message(&self, result: &PassResult) -> NotificationResult<Message> {
        let from_email = self.config.from_email.as_deref().ok_or_else(|| {
            NotificationError::ConfigurationError("From email not configured".to_string())
        })?;

        let mut builder = Message::builder()
            .from(Self::mailbox(from_email, self.config.from_name.as_deref())?)
            .subject(subject(result, &self.config.subject_prefix));
        for recipient in &self.config.to {
            builder = builder.to(Self::mailbox(recipient, None)?);
        }

        let text_body = self.renderer.render_text(result)?;
        let html_body = self.renderer.render_html(result)?;

        builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| NotificationError::SendFailed(format!("Failed to build email message: {}", e)))
    }

    fn transport(&self) -> NotificationResult<AsyncSmtpTransport<Tokio1Executor>> {
        let host = self.config.smtp_host.as_deref().ok_or_else(|| {
            NotificationError::ConfigurationError("SMTP host not configured".to_string())
        })?;

        let builder = if self.config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        }
        .map_err(|e| NotificationError::ConfigurationError(format!("Failed to create SMTP transport: {}", e)))?
        .port(self.config.smtp_port);

        let builder = match (&self.config.smtp_username, &self.config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(builder.build())
    }

    /// Send the report for `result`. A disabled notifier does nothing.
    #[instrument(skip(self, result))]
    pub async fn send(&self, result: &PassResult) -> NotificationResult<()> {
        if !self.config.enabled {
            debug!("Notifications disabled, skipping");
            return Ok(());
        }

        let message = self.build_message(result)?;
        let mailer = self.transport()?;

        mailer
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        info!(
            recipients = self.config.to.len(),
            "Report email sent successfully"
        );
        Ok(())
    }
}

#[async_trait]
impl ReportSink for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn publish(&self, result: &PassResult) -> LifecycleResult<()> {
        self.send(result)
            .await
            .map_err(|e| e.into_delivery_error(self.name()))
    }
}
