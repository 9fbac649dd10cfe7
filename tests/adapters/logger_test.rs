//! Logger adapter tests.

use mailroom::providers::LoggerMailer;
use mailroom::{Email, Mailer, MailerEntry, MailerOptions, MailerProvider};

fn email() -> Email {
    Email::new()
        .from(("T Stark", "tony.stark@example.com"))
        .to("steve.rogers@example.com")
        .cc("natasha.romanoff@example.com")
        .bcc("nick.fury@example.com")
        .subject("Hello, Avengers!")
        .text_body("Hello!")
        .html_body("<h1>Hello!</h1>")
}

#[tokio::test]
async fn deliver_returns_ok() {
    let delivery = LoggerMailer::new().deliver(&email()).await.unwrap();
    assert!(!delivery.message_id.is_empty());
}

#[tokio::test]
async fn deliver_with_full_logging_returns_ok() {
    let delivery = LoggerMailer::full().deliver(&email()).await.unwrap();
    assert!(!delivery.message_id.is_empty());
}

#[tokio::test]
async fn logger_as_default_mailer() {
    let provider = MailerProvider::new(
        MailerOptions::new("logger").mailer("logger", MailerEntry::instance(LoggerMailer::new())),
    );

    let first = provider.send_mail(&email()).await.unwrap();
    let second = provider.send_mail(&email()).await.unwrap();
    assert_ne!(first.message_id, second.message_id);
}
