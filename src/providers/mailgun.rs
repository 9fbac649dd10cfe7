//! Mailgun API provider.
//!
//! For reference: [Mailgun API docs](https://documentation.mailgun.com/en/latest/api-sending.html#sending)
//!
//! # Example
//!
//! ```rust,ignore
//! use mailroom::providers::{mailgun, MailgunConfig};
//! use mailroom::MailerEntry;
//!
//! let entry = MailerEntry::factory(|| {
//!     mailgun(MailgunConfig::new(std::env::var("MAILGUN_API_KEY").unwrap_or_default(), "mg.example.com"))
//! });
//! ```
//!
//! For EU domains, set `base_url` to `https://api.eu.mailgun.net/v3`.
//!
//! ## Provider Options
//!
//! * `tags` (list[string]) - sent as repeated `o:tag`
//! * `custom_vars` (map) - sent as the `h:X-Mailgun-Variables` header
//! * `sending_options` (map) - sent as `o:{key}`, booleans become `yes`/`no`

use async_trait::async_trait;
use base64::Engine;
use reqwest::{multipart::Form, Client};
use serde::Deserialize;
use serde_json::Value;

use crate::email::Email;
use crate::error::MailError;
use crate::mailer::{DeliveryResult, Mailer};

const MAILGUN_BASE_URL: &str = "https://api.mailgun.net/v3";

/// Settings for [`mailgun`].
#[derive(Debug, Clone, Default)]
pub struct MailgunConfig {
    /// API key.
    pub secret: String,
    /// Sending domain, e.g. "mg.example.com".
    pub domain: String,
    /// API base URL; defaults to the US region.
    pub base_url: Option<String>,
}

impl MailgunConfig {
    pub fn new(secret: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            domain: domain.into(),
            base_url: None,
        }
    }
}

/// Build a [`MailgunMailer`] from config.
///
/// Fails with [`MailError::Configuration`] when the secret is empty.
pub fn mailgun(config: MailgunConfig) -> Result<MailgunMailer, MailError> {
    if config.secret.is_empty() {
        return Err(MailError::Configuration("Mailgun secret is required".into()));
    }

    let mailer = MailgunMailer::new(config.secret, config.domain);
    Ok(match config.base_url {
        Some(url) => mailer.base_url(url),
        None => mailer,
    })
}

/// Mailgun API email provider.
pub struct MailgunMailer {
    api_key: String,
    domain: String,
    base_url: String,
    client: Client,
}

impl MailgunMailer {
    /// Create a new Mailgun mailer with the given API key and domain.
    pub fn new(api_key: impl Into<String>, domain: impl Into<String>) -> Self {
        Self::with_client(api_key, domain, Client::new())
    }

    /// Create with a custom reqwest client.
    pub fn with_client(
        api_key: impl Into<String>,
        domain: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            domain: domain.into(),
            base_url: MAILGUN_BASE_URL.to_string(),
            client,
        }
    }

    /// Set a custom base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn auth_header(&self) -> String {
        let credentials = format!("api:{}", self.api_key);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes())
        )
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.base_url.trim_end_matches('/'), self.domain)
    }
}

/// Flatten an email into Mailgun form fields, in send order.
fn form_fields(email: &Email) -> Result<Vec<(String, String)>, MailError> {
    let from = email
        .from
        .as_ref()
        .ok_or(MailError::MissingField("from"))?;
    if email.to.is_empty() {
        return Err(MailError::MissingField("to"));
    }

    let mut fields = vec![
        ("from".to_string(), from.formatted()),
        ("to".to_string(), Email::join(&email.to)),
        ("subject".to_string(), email.subject.clone()),
    ];

    if !email.cc.is_empty() {
        fields.push(("cc".to_string(), Email::join(&email.cc)));
    }
    if !email.bcc.is_empty() {
        fields.push(("bcc".to_string(), Email::join(&email.bcc)));
    }
    if let Some(ref text) = email.text_body {
        fields.push(("text".to_string(), text.clone()));
    }
    if let Some(ref html) = email.html_body {
        fields.push(("html".to_string(), html.clone()));
    }
    if let Some(reply_to) = email.reply_to.first() {
        fields.push(("h:Reply-To".to_string(), reply_to.email.clone()));
    }

    let mut headers: Vec<_> = email.headers.iter().collect();
    headers.sort();
    for (name, value) in headers {
        fields.push((format!("h:{}", name), value.clone()));
    }

    let options = &email.provider_options;
    if let Some(vars) = options.get("custom_vars") {
        fields.push(("h:X-Mailgun-Variables".to_string(), serde_json::to_string(vars)?));
    }
    if let Some(tags) = options.get("tags").and_then(Value::as_array) {
        for tag in tags.iter().filter_map(Value::as_str) {
            fields.push(("o:tag".to_string(), tag.to_string()));
        }
    }
    if let Some(sending) = options.get("sending_options").and_then(Value::as_object) {
        for (key, value) in sending {
            fields.push((format!("o:{}", key), encode_variable(value)));
        }
    }

    Ok(fields)
}

fn encode_variable(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "yes" } else { "no" }.to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    async fn deliver(&self, email: &Email) -> Result<DeliveryResult, MailError> {
        let form = form_fields(email)?
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        let response = self
            .client
            .post(self.messages_url())
            .header("Authorization", self.auth_header())
            .header("User-Agent", format!("mailroom/{}", crate::VERSION))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let result: MailgunResponse = response.json().await?;
            return Ok(DeliveryResult::with_response(
                result.id,
                serde_json::json!({
                    "provider": "mailgun",
                    "message": result.message,
                }),
            ));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<MailgunError>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        Err(MailError::provider_with_status(
            "mailgun",
            message,
            status.as_u16(),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "mailgun"
    }
}

#[derive(Debug, Deserialize)]
struct MailgunResponse {
    id: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct MailgunError {
    message: String,
}
