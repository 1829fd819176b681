//! Mailer facade: validates configuration once, then exposes a generic
//! `send` plus entry points bound to individual providers and senders.

use super::dispatch::DispatchConfig;
use crate::config::MailerConfig;
use crate::domain::{EmailRequest, SendOutcome, Sender};
use crate::email::{build_adapter, DefaultTransportFactory, ProviderAdapter, TransportFactory};
use crate::error::{Result, SendError};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Strict {}
    impl Sealed for super::Safe {}
}

/// How a mailer reports send failures.
///
/// The mode only shapes the return value; dispatch logic is identical.
pub trait Mode: sealed::Sealed + Send + Sync + 'static {
    const SAFE: bool;
    type Output: Send;

    fn finish(result: std::result::Result<(), SendError>) -> Self::Output;
}

/// Failures are returned as `Err(SendError)`
#[derive(Debug, Clone, Copy, Default)]
pub struct Strict;

/// Failures are returned as [`SendOutcome::Failure`]; `send` never errors
#[derive(Debug, Clone, Copy, Default)]
pub struct Safe;

impl Mode for Strict {
    const SAFE: bool = false;
    type Output = std::result::Result<(), SendError>;

    fn finish(result: std::result::Result<(), SendError>) -> Self::Output {
        result
    }
}

impl Mode for Safe {
    const SAFE: bool = true;
    type Output = SendOutcome;

    fn finish(result: std::result::Result<(), SendError>) -> Self::Output {
        result.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingKind {
    Provider,
    Sender,
}

#[derive(Debug, Clone)]
struct Binding {
    kind: BindingKind,
    id: String,
}

struct MailerInner {
    config: DispatchConfig,
    bindings: Vec<Binding>,
}

/// Email facade over a fixed set of providers and senders.
///
/// Cheap to clone; clones share the same immutable configuration and may be
/// used concurrently.
pub struct Mailer<M: Mode = Strict> {
    inner: Arc<MailerInner>,
    _mode: PhantomData<M>,
}

impl<M: Mode> Clone for Mailer<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _mode: PhantomData,
        }
    }
}

impl<M: Mode> fmt::Debug for Mailer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailer")
            .field("config", &self.inner.config)
            .field("bindings", &self.inner.bindings)
            .finish()
    }
}

impl<M: Mode> Mailer<M> {
    /// Validate providers and senders and build the mailer
    pub fn new(providers: Vec<ProviderAdapter>, senders: Vec<Sender>) -> Result<Self> {
        let config = DispatchConfig::new(providers, senders, M::SAFE)?;

        let bindings = config
            .providers()
            .iter()
            .filter(|p| !p.is_default())
            .map(|p| Binding {
                kind: BindingKind::Provider,
                id: p.id().to_string(),
            })
            .chain(
                config
                    .senders()
                    .iter()
                    .filter(|s| !s.is_default())
                    .map(|s| Binding {
                        kind: BindingKind::Sender,
                        id: s.id().to_string(),
                    }),
            )
            .collect();

        tracing::info!(
            providers = ?config.providers().iter().map(ProviderAdapter::id).collect::<Vec<_>>(),
            senders = ?config.senders().iter().map(Sender::id).collect::<Vec<_>>(),
            safe = M::SAFE,
            "Mailer configured"
        );

        Ok(Self {
            inner: Arc::new(MailerInner { config, bindings }),
            _mode: PhantomData,
        })
    }

    /// Send using the request's provider and sender ids, or the defaults
    pub async fn send(&self, request: EmailRequest) -> M::Output {
        M::finish(self.inner.config.dispatch(request).await)
    }

    /// Entry point bound to a non-default provider id
    pub fn provider(&self, id: &str) -> Option<Bound<M>> {
        self.bound(BindingKind::Provider, id)
    }

    /// Entry point bound to a non-default sender id
    pub fn sender(&self, id: &str) -> Option<Bound<M>> {
        self.bound(BindingKind::Sender, id)
    }

    /// Ids that have a provider-bound entry point, in registration order
    pub fn bound_providers(&self) -> impl Iterator<Item = &str> {
        self.bound_ids(BindingKind::Provider)
    }

    /// Ids that have a sender-bound entry point, in registration order
    pub fn bound_senders(&self) -> impl Iterator<Item = &str> {
        self.bound_ids(BindingKind::Sender)
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.inner.config
    }

    pub fn is_safe(&self) -> bool {
        M::SAFE
    }

    fn bound(&self, kind: BindingKind, id: &str) -> Option<Bound<M>> {
        self.inner
            .bindings
            .iter()
            .position(|b| b.kind == kind && b.id == id)
            .map(|index| Bound {
                mailer: self.clone(),
                index,
            })
    }

    fn bound_ids(&self, kind: BindingKind) -> impl Iterator<Item = &str> {
        self.inner
            .bindings
            .iter()
            .filter(move |b| b.kind == kind)
            .map(|b| b.id.as_str())
    }
}

/// Entry point with a provider or sender id pre-filled.
///
/// Owns a handle to the mailer so it can be moved into tasks.
pub struct Bound<M: Mode = Strict> {
    mailer: Mailer<M>,
    index: usize,
}

impl<M: Mode> Clone for Bound<M> {
    fn clone(&self) -> Self {
        Self {
            mailer: self.mailer.clone(),
            index: self.index,
        }
    }
}

impl<M: Mode> fmt::Debug for Bound<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Bound").field(self.binding()).finish()
    }
}

impl<M: Mode> Bound<M> {
    fn binding(&self) -> &Binding {
        &self.mailer.inner.bindings[self.index]
    }

    /// The bound provider or sender id
    pub fn id(&self) -> &str {
        &self.binding().id
    }

    /// Same as [`Mailer::send`] with the bound id filled in, replacing any
    /// `provider` (or `from`) already on the request
    pub async fn send(&self, mut request: EmailRequest) -> M::Output {
        let binding = self.binding();
        match binding.kind {
            BindingKind::Provider => request.provider = Some(binding.id.clone()),
            BindingKind::Sender => request.from = Some(binding.id.clone()),
        }
        self.mailer.send(request).await
    }
}

/// Mailer whose mode is only known at runtime, e.g. from `MAILMUX_SAFE_MODE`
#[derive(Debug, Clone)]
pub enum ConfiguredMailer {
    Strict(Mailer<Strict>),
    Safe(Mailer<Safe>),
}

impl ConfiguredMailer {
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe(_))
    }
}

/// Collects providers and senders before building a [`Mailer`]
#[derive(Default)]
pub struct MailerBuilder {
    providers: Vec<ProviderAdapter>,
    senders: Vec<Sender>,
    safe: bool,
}

impl MailerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build adapters and senders from declarative configuration. The
    /// configured mode is honoured by [`build_configured`](Self::build_configured).
    pub fn from_config(config: &MailerConfig) -> Result<Self> {
        Self::from_config_with_factory(config, &DefaultTransportFactory)
    }

    pub fn from_config_with_factory(
        config: &MailerConfig,
        factory: &dyn TransportFactory,
    ) -> Result<Self> {
        let providers = config
            .providers
            .iter()
            .map(|settings| build_adapter(factory, settings))
            .collect::<Result<Vec<_>>>()?;
        let senders = config
            .senders
            .iter()
            .cloned()
            .map(Sender::from_config)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            providers,
            senders,
            safe: config.safe,
        })
    }

    /// Request safe mode for [`build_configured`](Self::build_configured)
    pub fn safe(mut self, safe: bool) -> Self {
        self.safe = safe;
        self
    }

    pub fn provider(mut self, provider: ProviderAdapter) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn providers(mut self, providers: impl IntoIterator<Item = ProviderAdapter>) -> Self {
        self.providers.extend(providers);
        self
    }

    pub fn sender(mut self, sender: Sender) -> Self {
        self.senders.push(sender);
        self
    }

    pub fn senders(mut self, senders: impl IntoIterator<Item = Sender>) -> Self {
        self.senders.extend(senders);
        self
    }

    /// Build a mailer that returns failures as `Err`, regardless of the
    /// requested mode
    pub fn build(self) -> Result<Mailer<Strict>> {
        if self.safe {
            tracing::warn!("Safe mode was requested but a strict mailer is being built");
        }
        self.build_with()
    }

    /// Build a mailer that returns failures as [`SendOutcome`] values
    pub fn build_safe(self) -> Result<Mailer<Safe>> {
        self.build_with()
    }

    pub fn build_with<M: Mode>(self) -> Result<Mailer<M>> {
        Mailer::new(self.providers, self.senders)
    }

    /// Build in the requested mode (strict unless [`safe`](Self::safe) or the
    /// configuration asked for safe mode)
    pub fn build_configured(self) -> Result<ConfiguredMailer> {
        if self.safe {
            self.build_with().map(ConfiguredMailer::Safe)
        } else {
            self.build_with().map(ConfiguredMailer::Strict)
        }
    }
}
