//! Amazon SES adapter tests.
//!
//! Signatures depend on the current time, so these tests check the request
//! shape and response parsing rather than exact bodies.

#![cfg(feature = "amazon_ses")]

use mailroom::providers::{ses, AmazonSesMailer, SesConfig};
use mailroom::{Email, MailError, Mailer, MailerEntry, MailerOptions, MailerProvider};
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helper Functions
// ============================================================================

fn valid_email() -> Email {
    Email::new()
        .from("guybrush.threepwood@pirates.grog")
        .to("elaine.marley@triisland.gov")
        .bcc("lechuck@ghost.ship")
        .subject("Mighty Pirate Newsletter")
        .text_body("Hello")
        .html_body("<h1>Hello</h1>")
}

fn success_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(
        r#"<SendRawEmailResponse>
            <SendRawEmailResult>
                <MessageId>messageId</MessageId>
            </SendRawEmailResult>
            <ResponseMetadata>
                <RequestId>requestId</RequestId>
            </ResponseMetadata>
        </SendRawEmailResponse>"#,
    )
}

fn error_response() -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_string(
        r#"<ErrorResponse>
            <Error>
                <Type>Sender</Type>
                <Code>MessageRejected</Code>
                <Message>Email address is not verified.</Message>
            </Error>
            <RequestId>a97266f7-b062-11e7-b126-6b0f7a9b3379</RequestId>
        </ErrorResponse>"#,
    )
}

// ============================================================================
// Delivery Tests
// ============================================================================

#[tokio::test]
async fn successful_delivery_returns_ok() {
    let server = MockServer::start().await;
    let mailer = AmazonSesMailer::new("us-east-1", "test_access", "test_secret").host(server.uri());

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header_exists("authorization"))
        .and(header_exists("x-amz-date"))
        .and(body_string_contains("Action=SendRawEmail"))
        .and(body_string_contains("Destinations.member.2=lechuck%40ghost.ship"))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let delivery = mailer.deliver(&valid_email()).await.unwrap();
    assert_eq!(delivery.message_id, "messageId");
    assert_eq!(delivery.provider_response.unwrap()["request_id"], "requestId");
}

#[tokio::test]
async fn session_token_header_is_sent() {
    let server = MockServer::start().await;
    let mailer = AmazonSesMailer::new("us-east-1", "test_access", "test_secret")
        .session_token("session")
        .host(server.uri());

    Mock::given(method("POST"))
        .and(header_exists("x-amz-security-token"))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    assert!(mailer.deliver(&valid_email()).await.is_ok());
}

#[tokio::test]
async fn error_response_becomes_provider_error() {
    let server = MockServer::start().await;
    let mailer = AmazonSesMailer::new("us-east-1", "test_access", "test_secret").host(server.uri());

    Mock::given(method("POST"))
        .respond_with(error_response())
        .mount(&server)
        .await;

    let err = mailer.deliver(&valid_email()).await.unwrap_err();
    assert_eq!(
        err,
        MailError::provider_with_status(
            "amazon_ses",
            "[MessageRejected] Email address is not verified.",
            400
        )
    );
}

// ============================================================================
// Through the provider
// ============================================================================

#[tokio::test]
async fn provider_builds_ses_on_first_send() {
    let server = MockServer::start().await;
    let endpoint = server.uri();

    Mock::given(method("POST"))
        .respond_with(success_response())
        .expect(2)
        .mount(&server)
        .await;

    let provider = MailerProvider::new(MailerOptions::new("logger").mailer(
        "ses",
        MailerEntry::factory(move || {
            let mut config = SesConfig::new("us-east-1", "test_access", "test_secret");
            config.endpoint = Some(endpoint.clone());
            ses(config)
        }),
    ));

    assert!(!provider.is_resolved("ses"));
    let first = provider.send_mail_with("ses", &valid_email()).await.unwrap();
    let second = provider.send_mail_with("ses", &valid_email()).await.unwrap();
    assert_eq!(first.message_id, "messageId");
    assert_eq!(second.message_id, "messageId");
    assert!(provider.is_resolved("ses"));
}
