//! Logger mailer that only logs emails.
//!
//! Useful for staging environments or as a harmless default when no real
//! provider is configured.

use async_trait::async_trait;

use crate::email::Email;
use crate::error::MailError;
use crate::mailer::{DeliveryResult, Mailer};

/// Emits a tracing event per email instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LoggerMailer {
    log_full: bool,
}

impl LoggerMailer {
    /// Log recipients and subject only.
    pub fn new() -> Self {
        Self { log_full: false }
    }

    /// Also log every address and, at debug level, the bodies.
    pub fn full() -> Self {
        Self { log_full: true }
    }
}

#[async_trait]
impl Mailer for LoggerMailer {
    async fn deliver(&self, email: &Email) -> Result<DeliveryResult, MailError> {
        let message_id = uuid::Uuid::new_v4().to_string();

        if self.log_full {
            tracing::info!(
                message_id = %message_id,
                from = ?email.from.as_ref().map(|a| a.formatted()),
                to = %Email::join(&email.to),
                cc = %Email::join(&email.cc),
                bcc = %Email::join(&email.bcc),
                subject = %email.subject,
                has_html = email.html_body.is_some(),
                has_text = email.text_body.is_some(),
                "Email logged (full)"
            );
            if let Some(ref text) = email.text_body {
                tracing::debug!(body = %text, "Text body");
            }
            if let Some(ref html) = email.html_body {
                tracing::debug!(body = %html, "HTML body");
            }
        } else {
            tracing::info!(
                message_id = %message_id,
                to = ?email.to.iter().map(|a| &a.email).collect::<Vec<_>>(),
                subject = %email.subject,
                "Email logged"
            );
        }

        Ok(DeliveryResult::new(message_id))
    }

    fn provider_name(&self) -> &'static str {
        "logger"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logger_returns_message_id() {
        let email = Email::new()
            .from("sender@example.com")
            .to("recipient@example.com")
            .subject("Test Subject");

        let brief = LoggerMailer::new().deliver(&email).await.unwrap();
        let full = LoggerMailer::full().deliver(&email).await.unwrap();

        assert!(!brief.message_id.is_empty());
        assert_ne!(brief.message_id, full.message_id);
    }

    #[test]
    fn test_default_is_brief() {
        assert!(!LoggerMailer::default().log_full);
        assert_eq!(LoggerMailer::new().provider_name(), "logger");
    }
}
