//! Local mailer for development and testing.
//!
//! Keeps every delivered email in memory so tests can assert on what was
//! sent. Clones share the same mailbox, which makes it easy to hand one copy
//! to a [`MailerProvider`](crate::MailerProvider) and keep another for
//! assertions.
//!
//! ```rust,ignore
//! use mailroom::providers::LocalMailer;
//! use mailroom::{MailerEntry, MailerOptions, MailerProvider};
//!
//! let local = LocalMailer::new();
//! let provider = MailerProvider::new(
//!     MailerOptions::new("local").mailer("local", MailerEntry::instance(local.clone())),
//! );
//!
//! provider.send_mail(&email).await?;
//! assert!(local.sent_to("user@example.com"));
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::email::Email;
use crate::error::MailError;
use crate::mailer::{DeliveryResult, Mailer};

/// An email captured by [`LocalMailer`].
#[derive(Debug, Clone)]
pub struct SentEmail {
    /// Message ID returned from `deliver`.
    pub id: String,
    /// The email as delivered.
    pub email: Email,
    /// When it was captured.
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Mailbox {
    emails: Vec<SentEmail>,
    /// If set, deliver() returns this error.
    fail_with: Option<String>,
}

/// Mailer that stores emails in memory.
#[derive(Debug, Clone, Default)]
pub struct LocalMailer {
    mailbox: Arc<Mutex<Mailbox>>,
}

impl LocalMailer {
    /// Create a mailer with an empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following delivery fail with `message`.
    pub fn set_failure(&self, message: impl Into<String>) {
        self.mailbox.lock().fail_with = Some(message.into());
    }

    /// Clear the failure state.
    pub fn clear_failure(&self) {
        self.mailbox.lock().fail_with = None;
    }

    /// All captured emails, oldest first.
    pub fn emails(&self) -> Vec<SentEmail> {
        self.mailbox.lock().emails.clone()
    }

    /// The most recently captured email.
    pub fn last_email(&self) -> Option<SentEmail> {
        self.mailbox.lock().emails.last().cloned()
    }

    pub fn email_count(&self) -> usize {
        self.mailbox.lock().emails.len()
    }

    /// Remove and return all captured emails.
    pub fn flush(&self) -> Vec<SentEmail> {
        std::mem::take(&mut self.mailbox.lock().emails)
    }

    /// True if any captured email lists `address` as a recipient.
    pub fn sent_to(&self, address: &str) -> bool {
        self.mailbox.lock().emails.iter().any(|sent| {
            sent.email
                .to
                .iter()
                .any(|addr| addr.email.eq_ignore_ascii_case(address))
        })
    }
}

#[async_trait]
impl Mailer for LocalMailer {
    async fn deliver(&self, email: &Email) -> Result<DeliveryResult, MailError> {
        let mut mailbox = self.mailbox.lock();
        if let Some(ref message) = mailbox.fail_with {
            return Err(MailError::SendError(message.clone()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        mailbox.emails.push(SentEmail {
            id: id.clone(),
            email: email.clone(),
            sent_at: Utc::now(),
        });

        tracing::debug!(message_id = %id, subject = %email.subject, "Email captured");
        Ok(DeliveryResult::new(id))
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }
}
