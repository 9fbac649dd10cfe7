//! Environment-driven configuration.
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `MAILER_DEFAULT` | Default mailer name (`logger`, `logger_full`, `local`, `mailgun`, `amazon_ses`) |
//! | `MAILGUN_API_KEY` | Mailgun API key |
//! | `MAILGUN_DOMAIN` | Mailgun sending domain |
//! | `MAILGUN_BASE_URL` | Mailgun API base URL (optional, e.g. EU region) |
//! | `AWS_REGION` | AWS region for SES |
//! | `AWS_ACCESS_KEY_ID` | AWS access key |
//! | `AWS_SECRET_ACCESS_KEY` | AWS secret key |
//! | `AWS_SESSION_TOKEN` | AWS session token (optional) |
//!
//! Provider variables are read when the provider is first resolved, so a
//! missing key surfaces as a [`MailError::Configuration`] from
//! [`MailerProvider::mailer`](crate::MailerProvider::mailer) rather than at
//! startup.

use std::env;

#[cfg(any(feature = "mailgun", feature = "amazon_ses"))]
use crate::error::MailError;
use crate::provider::{MailerEntry, MailerOptions, MailerProvider};
use crate::providers;

const DEFAULT_MAILER: &str = "logger";

/// Pick a default from whichever provider credentials are present.
fn detect_default() -> Option<&'static str> {
    #[cfg(feature = "mailgun")]
    if env::var("MAILGUN_API_KEY").is_ok() && env::var("MAILGUN_DOMAIN").is_ok() {
        return Some("mailgun");
    }
    #[cfg(feature = "amazon_ses")]
    if env::var("AWS_ACCESS_KEY_ID").is_ok()
        && env::var("AWS_SECRET_ACCESS_KEY").is_ok()
        && env::var("AWS_REGION").is_ok()
    {
        return Some("amazon_ses");
    }
    None
}

#[cfg(any(feature = "mailgun", feature = "amazon_ses"))]
fn required(name: &str) -> Result<String, MailError> {
    env::var(name).map_err(|_| MailError::Configuration(format!("{} not set", name)))
}

#[cfg(feature = "mailgun")]
fn mailgun_from_env() -> Result<providers::MailgunMailer, MailError> {
    providers::mailgun(providers::MailgunConfig {
        secret: required("MAILGUN_API_KEY")?,
        domain: required("MAILGUN_DOMAIN")?,
        base_url: env::var("MAILGUN_BASE_URL").ok(),
    })
}

#[cfg(feature = "amazon_ses")]
fn ses_from_env() -> Result<providers::AmazonSesMailer, MailError> {
    let mut config = providers::SesConfig::new(
        required("AWS_REGION")?,
        required("AWS_ACCESS_KEY_ID")?,
        required("AWS_SECRET_ACCESS_KEY")?,
    );
    config.session_token = env::var("AWS_SESSION_TOKEN").ok();
    providers::ses(config)
}

impl MailerOptions {
    /// Options with every compiled-in provider registered.
    ///
    /// The default is `MAILER_DEFAULT` if set, otherwise the first provider
    /// whose credentials are present, otherwise `logger`.
    pub fn from_env() -> Self {
        let default = env::var("MAILER_DEFAULT")
            .map(|name| name.to_lowercase())
            .ok()
            .or_else(|| detect_default().map(String::from))
            .unwrap_or_else(|| DEFAULT_MAILER.to_string());

        tracing::debug!(default = %default, "Loading mailers from environment");

        #[allow(unused_mut)]
        let mut options = MailerOptions::new(default)
            .mailer("logger", MailerEntry::instance(providers::LoggerMailer::new()))
            .mailer("logger_full", MailerEntry::instance(providers::LoggerMailer::full()));

        #[cfg(feature = "local")]
        options.insert("local", MailerEntry::instance(providers::LocalMailer::new()));

        #[cfg(feature = "mailgun")]
        options.insert("mailgun", MailerEntry::factory(mailgun_from_env));

        #[cfg(feature = "amazon_ses")]
        options.insert("amazon_ses", MailerEntry::factory(ses_from_env));

        options
    }
}

impl MailerProvider {
    /// Shorthand for `MailerProvider::new(MailerOptions::from_env())`.
    pub fn from_env() -> Self {
        Self::new(MailerOptions::from_env())
    }
}
