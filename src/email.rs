//! Email struct with builder pattern.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::address::{Address, ToAddress};

/// Provider-agnostic description of an outgoing email.
///
/// This is the default message type understood by the bundled providers.
/// The provider core treats it as opaque.
///
/// ```
/// use mailroom::Email;
///
/// let email = Email::new()
///     .from("me@example.com")
///     .to("you@example.com")
///     .subject("Testing Mailer")
///     .text_body("Hello from the mock mailer!");
///
/// assert_eq!(email.to[0].email, "you@example.com");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Email {
    /// Sender address
    pub from: Option<Address>,
    /// Primary recipients
    pub to: Vec<Address>,
    /// Carbon copy recipients
    pub cc: Vec<Address>,
    /// Blind carbon copy recipients
    pub bcc: Vec<Address>,
    /// Reply-to addresses
    pub reply_to: Vec<Address>,
    /// Email subject line
    pub subject: String,
    /// Plain text body
    pub text_body: Option<String>,
    /// HTML body
    pub html_body: Option<String>,
    /// Custom email headers
    pub headers: HashMap<String, String>,
    /// Provider-specific options (e.g., tags, tracking)
    pub provider_options: HashMap<String, serde_json::Value>,
}

impl Email {
    /// Create a new empty email.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender address.
    pub fn from(mut self, addr: impl ToAddress) -> Self {
        self.from = Some(addr.to_address());
        self
    }

    /// Add a recipient.
    pub fn to(mut self, addr: impl ToAddress) -> Self {
        self.to.push(addr.to_address());
        self
    }

    /// Add a CC recipient.
    pub fn cc(mut self, addr: impl ToAddress) -> Self {
        self.cc.push(addr.to_address());
        self
    }

    /// Add a BCC recipient.
    pub fn bcc(mut self, addr: impl ToAddress) -> Self {
        self.bcc.push(addr.to_address());
        self
    }

    /// Add a reply-to address.
    pub fn reply_to(mut self, addr: impl ToAddress) -> Self {
        self.reply_to.push(addr.to_address());
        self
    }

    /// Set the subject line.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the plain text body.
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.text_body = Some(body.into());
        self
    }

    /// Set the HTML body.
    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.html_body = Some(body.into());
        self
    }

    /// Add a custom header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set a provider-specific option.
    ///
    /// ```rust,ignore
    /// Email::new()
    ///     .provider_option("tags", vec!["signup", "welcome"])
    ///     .provider_option("configuration_set_name", "transactional")
    /// ```
    pub fn provider_option(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.provider_options.insert(key.into(), value.into());
        self
    }

    /// Comma-joined list of formatted addresses, as used in headers.
    pub(crate) fn join(addrs: &[Address]) -> String {
        addrs
            .iter()
            .map(Address::formatted)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let email = Email::new()
            .from("sender@example.com")
            .to("recipient@example.com")
            .subject("Test")
            .text_body("Hello");

        assert_eq!(email.from.unwrap().email, "sender@example.com");
        assert_eq!(email.to.len(), 1);
        assert_eq!(email.subject, "Test");
        assert_eq!(email.text_body, Some("Hello".to_string()));
    }

    #[test]
    fn test_with_name() {
        let email = Email::new().from(("Alice", "alice@example.com"));

        let from = email.from.unwrap();
        assert_eq!(from.email, "alice@example.com");
        assert_eq!(from.name, Some("Alice".to_string()));
    }

    #[test]
    fn test_join() {
        let email = Email::new()
            .to("one@example.com")
            .to(("Two", "two@example.com"));

        assert_eq!(
            Email::join(&email.to),
            "one@example.com, Two <two@example.com>"
        );
    }

    #[test]
    fn test_provider_options() {
        let email = Email::new().provider_option("tags", vec!["welcome"]);

        assert_eq!(
            email.provider_options.get("tags"),
            Some(&serde_json::json!(["welcome"]))
        );
    }
}
