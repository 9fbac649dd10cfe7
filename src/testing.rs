//! Test transports for exercising code that sends mail.
//!
//! ```rust,ignore
//! use mailroom::testing::{CountingFactory, EchoMailer};
//! use mailroom::{MailerOptions, MailerProvider};
//!
//! let counter = CountingFactory::new();
//! let provider = MailerProvider::new(
//!     MailerOptions::new("test").mailer("test", counter.wrap(|| Ok(EchoMailer))),
//! );
//!
//! provider.mailer("test").await?;
//! provider.mailer("test").await?;
//! assert_eq!(counter.calls(), 1);
//! ```

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::MailError;
use crate::mailer::Mailer;
use crate::provider::MailerEntry;

/// Returns every message it is given, unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoMailer;

#[async_trait]
impl<M> Mailer<M, M> for EchoMailer
where
    M: Clone + Send + Sync + 'static,
{
    async fn deliver(&self, message: &M) -> Result<M, MailError> {
        Ok(message.clone())
    }

    fn provider_name(&self) -> &'static str {
        "echo"
    }
}

/// Fails every delivery with a fixed error.
#[derive(Debug, Clone)]
pub struct FailingMailer {
    error: MailError,
}

impl FailingMailer {
    /// Fail with `error` on every send.
    pub fn new(error: MailError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl<M, R> Mailer<M, R> for FailingMailer
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    async fn deliver(&self, _message: &M) -> Result<R, MailError> {
        Err(self.error.clone())
    }

    fn provider_name(&self) -> &'static str {
        "failing"
    }
}

/// Counts how often a wrapped factory runs.
///
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct CountingFactory {
    calls: Arc<AtomicUsize>,
}

impl CountingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of factory invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Turn `build` into a factory entry that bumps this counter each run.
    pub fn wrap<M, R, F, T>(&self, build: F) -> MailerEntry<M, R>
    where
        M: Send + Sync + 'static,
        R: Send + 'static,
        F: Fn() -> Result<T, MailError> + Send + Sync + 'static,
        T: Mailer<M, R> + 'static,
    {
        let calls = Arc::clone(&self.calls);
        MailerEntry::factory(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            build()
        })
    }

    /// Like [`wrap`](Self::wrap), for an async constructor.
    pub fn wrap_async<M, R, F, Fut, T>(&self, build: F) -> MailerEntry<M, R>
    where
        M: Send + Sync + 'static,
        R: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<T, MailError>> + Send + 'static,
        T: Mailer<M, R> + 'static,
    {
        let calls = Arc::clone(&self.calls);
        MailerEntry::async_factory(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            build()
        })
    }
}
