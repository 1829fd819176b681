//! Mailmux - Unified Email Sending
//!
//! This crate provides one facade for sending email through any number of
//! interchangeable delivery providers (SMTP, AWS SES, HTTP APIs) on behalf of
//! named senders, with strict (`Result`) and safe (`SendOutcome`) modes.

pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod service;
pub mod telemetry;

// Re-export commonly used types
pub use config::MailerConfig;
pub use domain::{Attachment, EmailAddress, EmailRequest, OutgoingEmail, SendOutcome, Sender};
pub use email::{Capabilities, EmailTransport, FnTransport, ProviderAdapter, ProviderError};
pub use error::{ConfigError, Result, SendError};
pub use service::{Bound, ConfiguredMailer, Mailer, MailerBuilder, Safe, Strict};
