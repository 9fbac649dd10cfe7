//! # Mailroom
//!
//! Register several named mail transports behind one interface, build each
//! one the first time it is used, and send through a default or a named one.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mailroom::{create_mailer, Email, MailerEntry, MailerOptions};
//! use mailroom::providers::{mailgun, ses, MailgunConfig, SesConfig};
//!
//! let options = MailerOptions::new("mailgun")
//!     .mailer("mailgun", MailerEntry::factory(|| {
//!         mailgun(MailgunConfig::new(std::env::var("MAILGUN_API_KEY").unwrap_or_default(), "mg.example.com"))
//!     }))
//!     .mailer("ses", MailerEntry::factory(|| ses(SesConfig::new("us-east-1", key_id, secret))));
//!
//! let mailer = create_mailer(&options);
//!
//! let email = Email::new()
//!     .from("me@example.com")
//!     .to("you@example.com")
//!     .subject("Hello")
//!     .text_body("Hi there");
//!
//! mailer.send_mail(&email).await?;             // default ("mailgun")
//! mailer.send_mail_with("ses", &email).await?; // explicit
//! ```
//!
//! Nothing is constructed until a mailer is first resolved. Unknown names
//! fail with [`MailError::MailerNotConfigured`]:
//!
//! ```text
//! Mailer missing is not configured.
//! ```
//!
//! ## Custom message types
//!
//! [`Mailer`] is generic over its message and result types, and so is
//! [`MailerProvider`]. The bundled providers use [`Email`] and
//! [`DeliveryResult`]; a provider of `Mailer<MyMessage, MyReceipt>` works the
//! same way.
//!
//! ## Feature Flags
//!
//! - `mailgun` - Mailgun API provider
//! - `amazon_ses` - Amazon SES API provider
//! - `local` - LocalMailer for development and testing (default)
//! - `metrics` - Prometheus-style metrics (counters/histograms)
//! - `full` - everything above
//!
//! ## Metrics
//!
//! Enable `features = ["metrics"]` to emit:
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `mailroom_sends_total` | Counter | mailer, status | Messages sent |
//! | `mailroom_send_duration_seconds` | Histogram | mailer | Send duration |
//! | `mailroom_resolutions_total` | Counter | mailer, cached | Mailer lookups |

/// The version of the mailroom crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod address;
mod config;
mod email;
mod error;
mod mailer;
mod provider;

pub mod providers;
pub mod testing;

// Re-exports
pub use address::{Address, ToAddress};
pub use email::Email;
pub use error::MailError;
pub use mailer::{DeliveryResult, Mailer};
pub use provider::{
    FactoryFuture, MailerEntry, MailerFactory, MailerOptions, MailerProvider, SharedMailer,
};

/// Create a provider from borrowed options.
///
/// The mailer map is copied, so later changes to `options` do not reach the
/// provider. Entries are shared (`Arc`), not rebuilt, and no factory runs.
pub fn create_mailer<M, R>(options: &MailerOptions<M, R>) -> MailerProvider<M, R>
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    MailerProvider::new(options.clone())
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::create_mailer;
    pub use crate::Address;
    pub use crate::DeliveryResult;
    pub use crate::Email;
    pub use crate::MailError;
    pub use crate::Mailer;
    pub use crate::MailerEntry;
    pub use crate::MailerOptions;
    pub use crate::MailerProvider;
    pub use crate::ToAddress;
}
