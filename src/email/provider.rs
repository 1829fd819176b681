//! Provider transport trait, adapter and error types

use crate::domain::{OutgoingEmail, DEFAULT_ID};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Email provider error types
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum ProviderError {
    #[error("Email provider not configured")]
    NotConfigured,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Rejected by provider ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Optional features a provider declares support for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub supports_attachments: bool,
}

impl Capabilities {
    pub const fn with_attachments() -> Self {
        Self {
            supports_attachments: true,
        }
    }

    pub const fn without_attachments() -> Self {
        Self {
            supports_attachments: false,
        }
    }
}

/// Transport contract implemented by every provider.
///
/// Ordinary delivery failures come back as `Err`; implementations must not
/// panic on them. Credentials and other provider state live inside the
/// implementation and are never inspected by the mailer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Deliver a fully resolved email
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ProviderError>;

    /// Diagnostic label, e.g. `"smtp"`
    fn provider_kind(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }
}

/// Adapts an async closure into an [`EmailTransport`]
pub struct FnTransport<F> {
    kind: &'static str,
    capabilities: Capabilities,
    func: F,
}

impl<F, Fut> FnTransport<F>
where
    F: Fn(OutgoingEmail) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ProviderError>> + Send,
{
    pub fn new(kind: &'static str, capabilities: Capabilities, func: F) -> Self {
        Self {
            kind,
            capabilities,
            func,
        }
    }
}

#[async_trait]
impl<F, Fut> EmailTransport for FnTransport<F>
where
    F: Fn(OutgoingEmail) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ProviderError>> + Send,
{
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ProviderError> {
        (self.func)(email.clone()).await
    }

    fn provider_kind(&self) -> &'static str {
        self.kind
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

/// A registered provider: lookup id, capability descriptor and transport.
#[derive(Clone)]
pub struct ProviderAdapter {
    id: String,
    kind: &'static str,
    capabilities: Capabilities,
    transport: Arc<dyn EmailTransport>,
}

impl ProviderAdapter {
    /// Wrap a transport under the `"default"` id, taking its declared capabilities
    pub fn new(transport: impl EmailTransport + 'static) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<dyn EmailTransport>) -> Self {
        Self {
            id: DEFAULT_ID.to_string(),
            kind: transport.provider_kind(),
            capabilities: transport.capabilities(),
            transport,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Override the capabilities reported by the transport
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn supports_attachments(&self) -> bool {
        self.capabilities.supports_attachments
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_ID
    }

    pub async fn send(&self, email: &OutgoingEmail) -> Result<(), ProviderError> {
        self.transport.send(email).await
    }
}

impl fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Headers every transport derives from the resolved email itself
const MANAGED_HEADERS: &[&str] = &[
    "from",
    "sender",
    "to",
    "cc",
    "bcc",
    "reply-to",
    "subject",
    "date",
    "mime-version",
    "content-type",
    "content-transfer-encoding",
];

/// Whether `name` is a header the transport sets from the resolved sender,
/// recipients, subject or body (case-insensitive)
pub fn is_managed_header(name: &str) -> bool {
    let name = name.trim();
    MANAGED_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Caller headers safe to pass to a provider. Managed headers are skipped
/// with a warning so they can never override the resolved sender or subject.
pub(crate) fn custom_headers(
    headers: &BTreeMap<String, String>,
) -> impl Iterator<Item = (&str, &str)> {
    headers.iter().filter_map(|(name, value)| {
        if is_managed_header(name) {
            tracing::warn!(header = %name, "Ignoring caller header managed by the mailer");
            None
        } else {
            Some((name.as_str(), value.as_str()))
        }
    })
}
