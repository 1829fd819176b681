//! Domain types: email requests, senders, provider settings and send outcomes

pub mod email;
pub mod provider;
pub mod sender;

pub use email::{Attachment, EmailAddress, EmailRequest, OutgoingEmail, Recipients, SendOutcome};
pub use provider::{ProviderConfig, ProviderSettings, ResendConfig, SesConfig, SmtpConfig};
pub use sender::{Sender, SenderConfig, DEFAULT_ID};
