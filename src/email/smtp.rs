//! SMTP email transport implementation using lettre

use super::provider::{custom_headers, Capabilities, EmailTransport, ProviderError};
use crate::domain::{EmailAddress, OutgoingEmail, Recipients, SmtpConfig};
use async_trait::async_trait;
use lettre::{
    message::{
        header::{ContentType, HeaderName, HeaderValue},
        Attachment, Mailbox, MultiPart, SinglePart,
    },
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

const DEFAULT_ATTACHMENT_TYPE: &str = "application/octet-stream";

/// SMTP-based email transport
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    /// Create a new SMTP transport from configuration
    pub fn from_config(config: &SmtpConfig) -> Result<Self, ProviderError> {
        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| ProviderError::InvalidConfiguration(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            let credentials = Credentials::new(username.clone(), password.clone());
            builder = builder.credentials(credentials);
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn parse_mailbox(addr: &EmailAddress) -> Result<Mailbox, ProviderError> {
    addr.to_string()
        .parse()
        .map_err(|e| ProviderError::InvalidConfiguration(format!("Invalid address {}: {}", addr, e)))
}

fn parse_mailboxes(recipients: &Recipients) -> Result<Vec<Mailbox>, ProviderError> {
    recipients.iter().map(parse_mailbox).collect()
}

/// Assemble the MIME message for an outgoing email
pub(crate) fn build_message(email: &OutgoingEmail) -> Result<Message, ProviderError> {
    let from = parse_mailbox(&email.sender.address())?;

    let to_list = parse_mailboxes(&email.to)?;
    if to_list.is_empty() {
        return Err(ProviderError::InvalidConfiguration(
            "No recipients specified".to_string(),
        ));
    }

    let mut builder = Message::builder().from(from).subject(&email.subject);

    for to in to_list {
        builder = builder.to(to);
    }
    if let Some(cc) = &email.cc {
        for mailbox in parse_mailboxes(cc)? {
            builder = builder.cc(mailbox);
        }
    }
    if let Some(bcc) = &email.bcc {
        for mailbox in parse_mailboxes(bcc)? {
            builder = builder.bcc(mailbox);
        }
    }
    if let Some(reply_to) = &email.reply_to {
        for mailbox in parse_mailboxes(reply_to)? {
            builder = builder.reply_to(mailbox);
        }
    }

    for (name, value) in custom_headers(&email.headers) {
        let header_name = HeaderName::new_from_ascii(name.to_string()).map_err(|e| {
            ProviderError::InvalidConfiguration(format!("Invalid header {}: {}", name, e))
        })?;
        builder = builder.raw_header(HeaderValue::new(header_name, value.to_string()));
    }

    let message = if email.attachments.is_empty() {
        match &email.text_body {
            Some(text) => builder.multipart(MultiPart::alternative_plain_html(
                text.clone(),
                email.html_body.clone(),
            )),
            None => builder.singlepart(SinglePart::html(email.html_body.clone())),
        }
    } else {
        let mut mixed = match &email.text_body {
            Some(text) => MultiPart::mixed().multipart(MultiPart::alternative_plain_html(
                text.clone(),
                email.html_body.clone(),
            )),
            None => MultiPart::mixed().singlepart(SinglePart::html(email.html_body.clone())),
        };
        for attachment in &email.attachments {
            let content_type = ContentType::parse(
                attachment
                    .content_type
                    .as_deref()
                    .unwrap_or(DEFAULT_ATTACHMENT_TYPE),
            )
            .map_err(|e| ProviderError::InvalidConfiguration(e.to_string()))?;
            mixed = mixed.singlepart(
                Attachment::new(attachment.filename.clone())
                    .body(attachment.content.clone(), content_type),
            );
        }
        builder.multipart(mixed)
    }
    .map_err(|e| ProviderError::SendFailed(e.to_string()))?;

    Ok(message)
}

fn classify_error(error_msg: String) -> ProviderError {
    if error_msg.contains("authentication") || error_msg.contains("AUTH") {
        ProviderError::AuthenticationFailed(error_msg)
    } else if error_msg.contains("connection") || error_msg.contains("timeout") {
        ProviderError::ConnectionError(error_msg)
    } else {
        ProviderError::SendFailed(error_msg)
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ProviderError> {
        let message = build_message(email)?;

        match self.transport.send(message).await {
            Ok(response) => {
                tracing::debug!(
                    code = %response.code(),
                    "SMTP relay accepted message"
                );
                Ok(())
            }
            Err(e) => Err(classify_error(e.to_string())),
        }
    }

    fn provider_kind(&self) -> &'static str {
        "smtp"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::with_attachments()
    }
}
