//! Mailer facade and dispatch core

pub mod dispatch;
pub mod mailer;

pub use dispatch::DispatchConfig;
pub use mailer::{Bound, ConfiguredMailer, Mailer, MailerBuilder, Mode, Safe, Strict};
