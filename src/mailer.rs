//! Mailer trait and delivery result types.
//!
//! # Why `async_trait`?
//!
//! The provider keeps every registered transport as an `Arc<dyn Mailer<M, R>>`
//! so that Mailgun, SES and test stubs can live side by side in one map.
//! Native async traits are not object-safe, so `#[async_trait]` boxes the
//! returned futures. Email sending is I/O-bound and the allocation never
//! shows up next to network latency.
//!
//! Concrete types can still be called directly without dynamic dispatch:
//!
//! ```ignore
//! let mailer = MailgunMailer::new(api_key, domain);
//! mailer.deliver(&email).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::email::Email;
use crate::error::MailError;

/// Result of a successful email delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// Message ID assigned by the provider
    pub message_id: String,
    /// Optional provider-specific response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_response: Option<serde_json::Value>,
}

impl DeliveryResult {
    /// Create a new delivery result with just a message ID.
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            provider_response: None,
        }
    }

    /// Create a delivery result with provider response.
    pub fn with_response(message_id: impl Into<String>, response: serde_json::Value) -> Self {
        Self {
            message_id: message_id.into(),
            provider_response: Some(response),
        }
    }
}

/// Anything able to send a message and report a provider-defined result.
///
/// `M` is the message type and `R` the result type. Both default to the
/// crate's [`Email`] and [`DeliveryResult`], which is what the bundled
/// providers use. The [`MailerProvider`](crate::MailerProvider) never looks
/// inside either, so custom transports are free to pick their own shapes.
///
/// # Example
///
/// ```ignore
/// use mailroom::{Email, Mailer};
/// use mailroom::providers::MailgunMailer;
///
/// let mailer = MailgunMailer::new("key-xxx", "mg.example.com");
///
/// let email = Email::new()
///     .from("sender@example.com")
///     .to("recipient@example.com")
///     .subject("Hello")
///     .text_body("World");
///
/// let result = mailer.deliver(&email).await?;
/// println!("Sent with ID: {}", result.message_id);
/// ```
#[async_trait]
pub trait Mailer<M = Email, R = DeliveryResult>: Send + Sync
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Send a single message.
    async fn deliver(&self, message: &M) -> Result<R, MailError>;

    /// Get the provider name (for logging/debugging).
    fn provider_name(&self) -> &'static str {
        "unknown"
    }
}
