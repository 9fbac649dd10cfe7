//! Error types for mailroom.

use thiserror::Error;

/// Errors that can occur when resolving mailers or sending emails.
///
/// The provider itself only ever raises [`MailError::MailerNotConfigured`].
/// Every other variant comes from a transport or a factory and is handed back
/// to the caller exactly as the transport produced it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MailError {
    /// No mailer is registered under the requested name.
    #[error("Mailer {0} is not configured.")]
    MailerNotConfigured(String),

    /// Configuration error (missing env var, invalid value, etc.)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing required field (e.g., from address).
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Error building the email message.
    #[error("Build error: {0}")]
    BuildError(String),

    /// Error sending the email.
    #[error("Send error: {0}")]
    SendError(String),

    /// Provider-specific error with details.
    #[error("Provider error ({provider}): {message}")]
    ProviderError {
        provider: &'static str,
        message: String,
        /// Optional HTTP status code
        status: Option<u16>,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl MailError {
    /// Create the error raised for an unknown mailer name.
    pub fn not_configured(name: impl Into<String>) -> Self {
        Self::MailerNotConfigured(name.into())
    }

    /// Create a provider-specific error.
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Self::ProviderError {
            provider,
            message: message.into(),
            status: None,
        }
    }

    /// Create a provider error with HTTP status.
    pub fn provider_with_status(
        provider: &'static str,
        message: impl Into<String>,
        status: u16,
    ) -> Self {
        Self::ProviderError {
            provider,
            message: message.into(),
            status: Some(status),
        }
    }

    /// True if this error was raised for an unknown mailer name.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::MailerNotConfigured(_))
    }
}

#[cfg(feature = "_http")]
impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for MailError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_message() {
        let err = MailError::not_configured("missing");
        assert_eq!(err.to_string(), "Mailer missing is not configured.");
        assert!(err.is_not_configured());
    }

    #[test]
    fn test_not_configured_empty_name() {
        let err = MailError::not_configured("");
        assert_eq!(err.to_string(), "Mailer  is not configured.");
    }

    #[test]
    fn test_provider_error_display() {
        let err = MailError::provider_with_status("mailgun", "Forbidden", 401);
        assert_eq!(err.to_string(), "Provider error (mailgun): Forbidden");
        assert!(!err.is_not_configured());
    }
}
