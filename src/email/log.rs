//! Log-only transport for development

use super::provider::{Capabilities, EmailTransport, ProviderError};
use crate::domain::OutgoingEmail;
use async_trait::async_trait;

/// Writes each email to the `tracing` log instead of delivering it
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

impl LogTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailTransport for LogTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ProviderError> {
        tracing::info!(
            from = %email.sender,
            to = ?email.to.to_strings(),
            cc = email.cc.as_ref().map_or(0, |r| r.len()),
            bcc = email.bcc.as_ref().map_or(0, |r| r.len()),
            subject = %email.subject,
            attachments = email.attachments.len(),
            "[Log Mailer] email not delivered"
        );
        tracing::debug!(html = %email.html_body, text = ?email.text_body, "[Log Mailer] body");
        Ok(())
    }

    fn provider_kind(&self) -> &'static str {
        "log"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::with_attachments()
    }
}
