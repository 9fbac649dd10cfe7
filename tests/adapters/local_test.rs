//! Local adapter tests.

#![cfg(feature = "local")]

use mailroom::providers::LocalMailer;
use mailroom::{Email, MailError, MailerEntry, MailerOptions, MailerProvider};

fn email(to: &str) -> Email {
    Email::new()
        .from("sender@example.com")
        .to(to)
        .subject("Welcome")
        .text_body("Hello")
}

fn provider(local: &LocalMailer) -> MailerProvider {
    MailerProvider::new(
        MailerOptions::new("local").mailer("local", MailerEntry::instance(local.clone())),
    )
}

#[tokio::test]
async fn captures_emails_sent_through_provider() {
    let local = LocalMailer::new();
    let provider = provider(&local);

    let delivery = provider.send_mail(&email("user@example.com")).await.unwrap();

    assert_eq!(local.email_count(), 1);
    assert!(local.sent_to("user@example.com"));
    let last = local.last_email().unwrap();
    assert_eq!(last.id, delivery.message_id);
    assert_eq!(last.email, email("user@example.com"));
}

#[tokio::test]
async fn simulated_failure_passes_through_provider() {
    let local = LocalMailer::new();
    let provider = provider(&local);
    local.set_failure("SMTP connection refused");

    let err = provider
        .send_mail_with("local", &email("user@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err, MailError::SendError("SMTP connection refused".into()));
    assert_eq!(local.email_count(), 0);

    local.clear_failure();
    provider.send_mail(&email("user@example.com")).await.unwrap();
    assert_eq!(local.flush().len(), 1);
    assert_eq!(local.email_count(), 0);
}

#[tokio::test]
async fn emails_are_kept_in_send_order() {
    let local = LocalMailer::new();
    let provider = provider(&local);

    for to in ["a@example.com", "b@example.com", "c@example.com"] {
        provider.send_mail(&email(to)).await.unwrap();
    }

    let recipients: Vec<String> = local
        .emails()
        .into_iter()
        .map(|sent| sent.email.to[0].email.clone())
        .collect();
    assert_eq!(recipients, vec!["a@example.com", "b@example.com", "c@example.com"]);
}
