//! Amazon Simple Email Service (SES) API provider.
//!
//! For reference: [Amazon SES API docs](https://docs.aws.amazon.com/ses/latest/APIReference/API_SendRawEmail.html)
//!
//! Sends through the `SendRawEmail` query action with a hand-built MIME
//! message, signed with AWS Signature v4.
//!
//! # Example
//!
//! ```rust,ignore
//! use mailroom::providers::{ses, SesConfig};
//! use mailroom::MailerEntry;
//!
//! let entry = MailerEntry::factory(|| ses(SesConfig::new("us-east-1", access_key, secret)));
//! ```
//!
//! ## Provider Options
//!
//! * `tags` (list[{name, value}]) - message tags
//! * `configuration_set_name` (string) - overrides the mailer's configuration set

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::Client;
use ring::hmac;
use sha2::{Digest, Sha256};

use crate::email::Email;
use crate::error::MailError;
use crate::mailer::{DeliveryResult, Mailer};

const SERVICE: &str = "ses";
const ACTION: &str = "SendRawEmail";
const API_VERSION: &str = "2010-12-01";
const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Settings for [`ses`].
#[derive(Debug, Clone, Default)]
pub struct SesConfig {
    /// AWS region, e.g. "us-east-1".
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Session token for temporary (STS / IAM role) credentials.
    pub session_token: Option<String>,
    /// Endpoint override (VPC endpoints, tests).
    pub endpoint: Option<String>,
    /// Default configuration set applied to every message.
    pub configuration_set: Option<String>,
}

impl SesConfig {
    pub fn new(
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            ..Self::default()
        }
    }
}

/// Build an [`AmazonSesMailer`] from config.
///
/// Fails with [`MailError::Configuration`] when the region or credentials
/// are empty.
pub fn ses(config: SesConfig) -> Result<AmazonSesMailer, MailError> {
    if config.region.is_empty() {
        return Err(MailError::Configuration("SES region is required".into()));
    }
    if config.access_key_id.is_empty() || config.secret_access_key.is_empty() {
        return Err(MailError::Configuration("SES credentials are required".into()));
    }

    let mut mailer = AmazonSesMailer::new(
        config.region,
        config.access_key_id,
        config.secret_access_key,
    );
    mailer.session_token = config.session_token;
    mailer.configuration_set = config.configuration_set;
    if let Some(endpoint) = config.endpoint {
        mailer = mailer.host(endpoint);
    }
    Ok(mailer)
}

/// Amazon SES API email provider.
pub struct AmazonSesMailer {
    region: String,
    access_key: String,
    secret: String,
    session_token: Option<String>,
    host: Option<String>,
    configuration_set: Option<String>,
    client: Client,
}

impl AmazonSesMailer {
    /// Create a new Amazon SES mailer.
    pub fn new(
        region: impl Into<String>,
        access_key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            access_key: access_key.into(),
            secret: secret.into(),
            session_token: None,
            host: None,
            configuration_set: None,
            client: Client::new(),
        }
    }

    /// Use a custom reqwest client.
    pub fn client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Set a custom endpoint URL (for testing or VPC endpoints).
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sign requests with a temporary session token.
    pub fn session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Apply a configuration set to every message.
    pub fn configuration_set(mut self, name: impl Into<String>) -> Self {
        self.configuration_set = Some(name.into());
        self
    }

    fn endpoint(&self) -> String {
        self.host
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.host_header()))
    }

    fn host_header(&self) -> String {
        format!("email.{}.amazonaws.com", self.region)
    }

    fn request_body(&self, email: &Email) -> Result<String, MailError> {
        let raw = base64::engine::general_purpose::STANDARD.encode(build_mime_message(email)?);

        let mut params = vec![
            ("Action".to_string(), ACTION.to_string()),
            ("Version".to_string(), API_VERSION.to_string()),
            ("RawMessage.Data".to_string(), raw),
        ];

        // BCC never appears in the MIME headers, so every recipient is listed here.
        for (i, addr) in email.to.iter().chain(&email.cc).chain(&email.bcc).enumerate() {
            params.push((format!("Destinations.member.{}", i + 1), addr.email.clone()));
        }

        let configuration_set = email
            .provider_options
            .get("configuration_set_name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| self.configuration_set.clone());
        if let Some(name) = configuration_set {
            params.push(("ConfigurationSetName".to_string(), name));
        }

        let tags = email
            .provider_options
            .get("tags")
            .and_then(|v| v.as_array())
            .into_iter()
            .flatten()
            .filter_map(|tag| {
                Some((
                    tag.get("name")?.as_str()?.to_string(),
                    tag.get("value")?.as_str()?.to_string(),
                ))
            });
        for (i, (name, value)) in tags.enumerate() {
            params.push((format!("Tags.member.{}.Name", i + 1), name));
            params.push((format!("Tags.member.{}.Value", i + 1), value));
        }

        params.sort();
        Ok(params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&"))
    }

    /// Headers for a signed POST of `body`, including `Authorization`.
    fn signed_headers(&self, body: &str, now: DateTime<Utc>) -> Vec<(String, String)> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        // Lowercase names, sorted, as SigV4 canonicalisation requires.
        let mut headers = vec![
            (
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ),
            ("host".to_string(), self.host_header()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(ref token) = self.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }

        let signed_names = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
            .collect();
        let canonical_request = format!(
            "POST\n/\n\n{}\n{}\n{}",
            canonical_headers,
            signed_names,
            hex_sha256(body.as_bytes())
        );

        let scope = format!("{}/{}/{}/aws4_request", date, self.region, SERVICE);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key = [self.region.as_bytes(), SERVICE.as_bytes(), &b"aws4_request"[..]]
            .iter()
            .fold(
                hmac_sha256(format!("AWS4{}", self.secret).as_bytes(), date.as_bytes()),
                |key, part| hmac_sha256(&key, part),
            );
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        headers.push((
            "authorization".to_string(),
            format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                ALGORITHM, self.access_key, scope, signed_names, signature
            ),
        ));
        headers
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    hmac::sign(&key, data).as_ref().to_vec()
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Render an email as a MIME message.
fn build_mime_message(email: &Email) -> Result<Vec<u8>, MailError> {
    let from = email
        .from
        .as_ref()
        .ok_or(MailError::MissingField("from"))?;
    if email.to.is_empty() {
        return Err(MailError::MissingField("to"));
    }

    let mut message = format!("From: {}\r\nTo: {}\r\n", from.formatted(), Email::join(&email.to));
    if !email.cc.is_empty() {
        message.push_str(&format!("Cc: {}\r\n", Email::join(&email.cc)));
    }
    if !email.reply_to.is_empty() {
        message.push_str(&format!("Reply-To: {}\r\n", Email::join(&email.reply_to)));
    }
    message.push_str(&format!("Subject: {}\r\nMIME-Version: 1.0\r\n", email.subject));

    let mut headers: Vec<_> = email.headers.iter().collect();
    headers.sort();
    for (name, value) in headers {
        message.push_str(&format!("{}: {}\r\n", name, value));
    }

    match (&email.text_body, &email.html_body) {
        (Some(text), Some(html)) => {
            let boundary = format!("mailroom-{}", uuid::Uuid::new_v4().simple());
            message.push_str(&format!(
                "Content-Type: multipart/alternative; boundary=\"{}\"\r\n\r\n",
                boundary
            ));
            for (subtype, body) in [("plain", text), ("html", html)] {
                message.push_str(&format!("--{}\r\n", boundary));
                push_part(&mut message, subtype, body);
                message.push_str("\r\n");
            }
            message.push_str(&format!("--{}--\r\n", boundary));
        }
        (None, Some(html)) => push_part(&mut message, "html", html),
        (Some(text), None) => push_part(&mut message, "plain", text),
        (None, None) => push_part(&mut message, "plain", ""),
    }

    Ok(message.into_bytes())
}

fn push_part(message: &mut String, subtype: &str, body: &str) {
    message.push_str(&format!(
        "Content-Type: text/{}; charset=utf-8\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{}",
        subtype, body
    ));
}

#[async_trait]
impl Mailer for AmazonSesMailer {
    async fn deliver(&self, email: &Email) -> Result<DeliveryResult, MailError> {
        let body = self.request_body(email)?;

        let mut request = self.client.post(self.endpoint());
        for (name, value) in self.signed_headers(&body, Utc::now()) {
            // reqwest derives Host from the URL.
            if name != "host" {
                request = request.header(name, value);
            }
        }

        let response = request
            .header("User-Agent", format!("mailroom/{}", crate::VERSION))
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            let message_id = extract_xml_value(&text, "MessageId").unwrap_or_default();
            let request_id = extract_xml_value(&text, "RequestId").unwrap_or_default();
            return Ok(DeliveryResult::with_response(
                message_id,
                serde_json::json!({
                    "provider": "amazon_ses",
                    "request_id": request_id,
                }),
            ));
        }

        let code = extract_xml_value(&text, "Code").unwrap_or_else(|| "Unknown".to_string());
        let message =
            extract_xml_value(&text, "Message").unwrap_or_else(|| "Unknown error".to_string());
        Err(MailError::provider_with_status(
            "amazon_ses",
            format!("[{}] {}", code, message),
            status.as_u16(),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "amazon_ses"
    }
}

/// Pull the text of the first `<tag>...</tag>` out of an XML response.
fn extract_xml_value(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(xml[start..end].trim().to_string())
}
