//! Email delivery providers
//!
//! Every provider implements [`EmailTransport`] and is registered with a
//! mailer as a [`ProviderAdapter`]:
//! - SMTP (using lettre)
//! - AWS SES
//! - Resend HTTP API
//! - Log-only transport for development

pub mod factory;
pub mod log;
pub mod provider;
pub mod resend;
pub mod ses;
pub mod smtp;

pub use factory::{build_adapter, DefaultTransportFactory, TransportFactory};
pub use log::LogTransport;
pub use provider::{
    is_managed_header, Capabilities, EmailTransport, FnTransport, ProviderAdapter, ProviderError,
};
pub use resend::ResendTransport;
pub use ses::SesTransport;
pub use smtp::SmtpTransport;
