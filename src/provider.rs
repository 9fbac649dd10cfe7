//! Named mailers, built on first use and cached for the provider's lifetime.
//!
//! A [`MailerProvider`] holds a map from logical names (`"mailgun"`, `"ses"`,
//! `"test"`) to [`MailerEntry`] values. An entry is either a ready transport
//! or a factory that builds one. Nothing is built when the provider is
//! created; the first [`MailerProvider::mailer`] call for a name runs its
//! factory and every later call gets the same `Arc` back.
//!
//! ```rust,ignore
//! use mailroom::{create_mailer, Email, MailerEntry, MailerOptions};
//! use mailroom::providers::{mailgun, MailgunConfig, LoggerMailer};
//!
//! let options = MailerOptions::new("mailgun")
//!     .mailer("mailgun", MailerEntry::factory(|| mailgun(MailgunConfig::new(secret, domain))))
//!     .mailer("logger", MailerEntry::instance(LoggerMailer::new()));
//!
//! let mailer = create_mailer(&options);
//! mailer.send_mail(&email).await?;                 // default mailer
//! mailer.send_mail_with("logger", &email).await?;  // named mailer
//! ```
//!
//! ## Concurrent first use
//!
//! By default two tasks resolving the same uncached name at the same time may
//! both run its factory; the last one to finish wins the cache slot. Call
//! [`MailerProvider::single_flight`] to share a single in-flight build per
//! name instead.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::Instrument;

#[cfg(feature = "metrics")]
use std::time::Instant;

use crate::email::Email;
use crate::error::MailError;
use crate::mailer::{DeliveryResult, Mailer};

/// A shared, type-erased mailer.
pub type SharedMailer<M = Email, R = DeliveryResult> = Arc<dyn Mailer<M, R>>;

/// Future returned by a [`MailerFactory`].
pub type FactoryFuture<M = Email, R = DeliveryResult> =
    Pin<Box<dyn Future<Output = Result<SharedMailer<M, R>, MailError>> + Send>>;

/// Zero-argument constructor for a mailer.
///
/// Use [`MailerEntry::factory`] or [`MailerEntry::async_factory`] rather than
/// building one by hand.
pub type MailerFactory<M = Email, R = DeliveryResult> =
    Arc<dyn Fn() -> FactoryFuture<M, R> + Send + Sync>;

/// What a name maps to: a transport, or a way to make one.
pub enum MailerEntry<M = Email, R = DeliveryResult>
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Already constructed; cached as-is on first resolution.
    Instance(SharedMailer<M, R>),
    /// Invoked on first resolution; its output is cached.
    Factory(MailerFactory<M, R>),
}

impl<M, R> MailerEntry<M, R>
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Wrap a ready transport.
    pub fn instance<T>(mailer: T) -> Self
    where
        T: Mailer<M, R> + 'static,
    {
        Self::Instance(Arc::new(mailer))
    }

    /// Wrap an already shared transport.
    pub fn shared(mailer: SharedMailer<M, R>) -> Self {
        Self::Instance(mailer)
    }

    /// Register a synchronous constructor.
    ///
    /// ```rust,ignore
    /// MailerEntry::factory(|| mailgun(MailgunConfig::new(secret, domain)))
    /// ```
    pub fn factory<F, T>(build: F) -> Self
    where
        F: Fn() -> Result<T, MailError> + Send + Sync + 'static,
        T: Mailer<M, R> + 'static,
    {
        Self::Factory(Arc::new(move || -> FactoryFuture<M, R> {
            let built = build().map(|mailer| Arc::new(mailer) as SharedMailer<M, R>);
            Box::pin(std::future::ready(built))
        }))
    }

    /// Register an asynchronous constructor.
    ///
    /// ```rust,ignore
    /// MailerEntry::async_factory(|| async {
    ///     let secret = vault.read("mailgun").await?;
    ///     mailgun(MailgunConfig::new(secret, "mg.example.com"))
    /// })
    /// ```
    pub fn async_factory<F, Fut, T>(build: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, MailError>> + Send + 'static,
        T: Mailer<M, R> + 'static,
    {
        Self::Factory(Arc::new(move || -> FactoryFuture<M, R> {
            let pending = build();
            Box::pin(async move {
                pending
                    .await
                    .map(|mailer| Arc::new(mailer) as SharedMailer<M, R>)
            })
        }))
    }

    /// True for entries that run a factory on resolution.
    pub fn is_factory(&self) -> bool {
        matches!(self, Self::Factory(_))
    }

    async fn build(&self) -> Result<SharedMailer<M, R>, MailError> {
        match self {
            Self::Instance(mailer) => Ok(Arc::clone(mailer)),
            Self::Factory(factory) => factory().await,
        }
    }
}

impl<M, R> Clone for MailerEntry<M, R>
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    fn clone(&self) -> Self {
        match self {
            Self::Instance(mailer) => Self::Instance(Arc::clone(mailer)),
            Self::Factory(factory) => Self::Factory(Arc::clone(factory)),
        }
    }
}

impl<M, R> fmt::Debug for MailerEntry<M, R>
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(mailer) => f
                .debug_tuple("Instance")
                .field(&mailer.provider_name())
                .finish(),
            Self::Factory(_) => f.write_str("Factory"),
        }
    }
}

/// Options for building a [`MailerProvider`].
pub struct MailerOptions<M = Email, R = DeliveryResult>
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Name used when no mailer is given explicitly.
    pub default: String,
    /// Registered mailers by name.
    pub mailers: HashMap<String, MailerEntry<M, R>>,
}

impl<M, R> MailerOptions<M, R>
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Start with a default name and no mailers.
    ///
    /// The default is not checked here; an unknown default only fails when
    /// it is first used.
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            mailers: HashMap::new(),
        }
    }

    /// Register a mailer under `name`, replacing any previous entry.
    pub fn mailer(mut self, name: impl Into<String>, entry: MailerEntry<M, R>) -> Self {
        self.insert(name, entry);
        self
    }

    /// Register a mailer in place.
    pub fn insert(&mut self, name: impl Into<String>, entry: MailerEntry<M, R>) {
        self.mailers.insert(name.into(), entry);
    }
}

impl<M, R> Clone for MailerOptions<M, R>
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            default: self.default.clone(),
            mailers: self.mailers.clone(),
        }
    }
}

impl<M, R> fmt::Debug for MailerOptions<M, R>
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailerOptions")
            .field("default", &self.default)
            .field("mailers", &self.mailers)
            .finish()
    }
}

/// Resolves named mailers on demand and caches them.
///
/// See the [module docs](self) for an overview.
pub struct MailerProvider<M = Email, R = DeliveryResult>
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    default: String,
    config: HashMap<String, MailerEntry<M, R>>,
    resolved: RwLock<HashMap<String, SharedMailer<M, R>>>,
    in_flight: Option<Mutex<HashMap<String, Arc<OnceCell<SharedMailer<M, R>>>>>>,
}

impl<M, R> MailerProvider<M, R>
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Create a provider that owns `options`.
    ///
    /// No factory runs here. Use [`create_mailer`](crate::create_mailer) to
    /// build from borrowed options instead.
    pub fn new(options: MailerOptions<M, R>) -> Self {
        let MailerOptions { default, mailers } = options;
        tracing::debug!(
            default = %default,
            mailers = mailers.len(),
            "Mailer provider created"
        );
        Self {
            default,
            config: mailers,
            resolved: RwLock::new(HashMap::new()),
            in_flight: None,
        }
    }

    /// Share one factory invocation between concurrent first resolutions of
    /// the same name.
    ///
    /// A failed build is not remembered; the next call retries the factory.
    pub fn single_flight(mut self) -> Self {
        self.in_flight = Some(Mutex::new(HashMap::new()));
        self
    }

    /// The default mailer name, exactly as configured.
    pub fn default_name(&self) -> &str {
        &self.default
    }

    /// Registered mailer names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.config.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// True if a mailer is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.config.contains_key(name)
    }

    /// True if `name` has already been resolved and cached.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.resolved.read().contains_key(name)
    }

    /// Resolve a mailer by name, or the default mailer for `None`.
    ///
    /// The first call for a name builds the mailer; later calls return the
    /// same instance. Fails with [`MailError::MailerNotConfigured`] for
    /// unknown names. Factory errors are returned unchanged and nothing is
    /// cached for that name.
    pub async fn mailer<'a>(
        &self,
        name: impl Into<Option<&'a str>>,
    ) -> Result<SharedMailer<M, R>, MailError> {
        let name = name.into().unwrap_or(self.default.as_str());

        let cached = self.resolved.read().get(name).cloned();
        if let Some(mailer) = cached {
            tracing::debug!(mailer = name, "Mailer cache hit");
            #[cfg(feature = "metrics")]
            metrics::counter!("mailroom_resolutions_total", "mailer" => name.to_string(), "cached" => "true")
                .increment(1);
            return Ok(mailer);
        }

        let entry = self.entry(name)?;
        tracing::debug!(mailer = name, factory = entry.is_factory(), "Resolving mailer");

        let mailer = match &self.in_flight {
            Some(in_flight) => {
                let cell = {
                    let mut cells = in_flight.lock();
                    Arc::clone(cells.entry(name.to_string()).or_default())
                };
                let mailer = cell.get_or_try_init(|| entry.build()).await?;
                Arc::clone(mailer)
            }
            None => entry.build().await?,
        };

        self.resolved
            .write()
            .insert(name.to_string(), Arc::clone(&mailer));

        #[cfg(feature = "metrics")]
        metrics::counter!("mailroom_resolutions_total", "mailer" => name.to_string(), "cached" => "false")
            .increment(1);

        tracing::debug!(
            mailer = name,
            provider = mailer.provider_name(),
            "Mailer resolved"
        );
        Ok(mailer)
    }

    /// Build a fresh mailer for `name`, bypassing the cache.
    ///
    /// Factories run on every call and the result is not stored. Instance
    /// entries are returned as registered.
    pub async fn driver<'a>(
        &self,
        name: impl Into<Option<&'a str>>,
    ) -> Result<SharedMailer<M, R>, MailError> {
        let name = name.into().unwrap_or(self.default.as_str());
        self.entry(name)?.build().await
    }

    /// Send through the default mailer.
    pub async fn send_mail(&self, message: &M) -> Result<R, MailError> {
        self.send_mail_with(None, message).await
    }

    /// Send through the named mailer, or the default one for `None`.
    ///
    /// Errors from the transport are returned exactly as produced.
    pub async fn send_mail_with<'a>(
        &self,
        name: impl Into<Option<&'a str>>,
        message: &M,
    ) -> Result<R, MailError> {
        let name = name.into().unwrap_or(self.default.as_str());
        let mailer = self.mailer(name).await?;

        let span = tracing::info_span!(
            "mailroom.send",
            mailer = name,
            provider = mailer.provider_name(),
        );

        async move {
            #[cfg(feature = "metrics")]
            let start = Instant::now();

            let result = mailer.deliver(message).await;

            #[cfg(feature = "metrics")]
            {
                let status = if result.is_ok() { "success" } else { "error" };
                metrics::counter!("mailroom_sends_total", "mailer" => name.to_string(), "status" => status)
                    .increment(1);
                metrics::histogram!("mailroom_send_duration_seconds", "mailer" => name.to_string())
                    .record(start.elapsed().as_secs_f64());
            }

            match &result {
                Ok(_) => tracing::info!("Mail sent"),
                Err(e) => tracing::error!(error = %e, "Mail delivery failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn entry(&self, name: &str) -> Result<&MailerEntry<M, R>, MailError> {
        self.config.get(name).ok_or_else(|| {
            tracing::warn!(mailer = name, "Mailer is not configured");
            MailError::not_configured(name)
        })
    }
}

impl<M, R> fmt::Debug for MailerProvider<M, R>
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut resolved: Vec<String> = self.resolved.read().keys().cloned().collect();
        resolved.sort_unstable();
        f.debug_struct("MailerProvider")
            .field("default", &self.default)
            .field("mailers", &self.names())
            .field("resolved", &resolved)
            .field("single_flight", &self.in_flight.is_some())
            .finish()
    }
}

/// A provider is itself a mailer that sends through its default entry.
#[async_trait]
impl<M, R> Mailer<M, R> for MailerProvider<M, R>
where
    M: Send + Sync + 'static,
    R: Send + 'static,
{
    async fn deliver(&self, message: &M) -> Result<R, MailError> {
        self.send_mail(message).await
    }

    fn provider_name(&self) -> &'static str {
        "provider"
    }
}
