//! Email provider implementations.
//!
//! Each provider implements the [`Mailer`](crate::Mailer) trait and can be
//! registered with a [`MailerProvider`](crate::MailerProvider) either as an
//! instance or behind a factory.
//!
//! ## Available Providers
//!
//! | Provider | Feature Flag | Description |
//! |----------|-------------|-------------|
//! | [`MailgunMailer`] | `mailgun` | Mailgun API |
//! | [`AmazonSesMailer`] | `amazon_ses` | Amazon SES API |
//! | [`LocalMailer`] | `local` | In-memory capture for dev/testing |
//! | [`LoggerMailer`] | (none) | Logs emails without sending |

#[cfg(feature = "mailgun")]
mod mailgun;
#[cfg(feature = "mailgun")]
pub use mailgun::{mailgun, MailgunConfig, MailgunMailer};

#[cfg(feature = "amazon_ses")]
mod amazon_ses;
#[cfg(feature = "amazon_ses")]
pub use amazon_ses::{ses, AmazonSesMailer, SesConfig};

#[cfg(feature = "local")]
mod local;
#[cfg(feature = "local")]
pub use local::{LocalMailer, SentEmail};

mod logger;
pub use logger::LoggerMailer;
