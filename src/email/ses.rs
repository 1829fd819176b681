//! AWS SES email transport implementation
//!
//! Provides email sending via AWS Simple Email Service (SES) v2 API using
//! simple content, which carries custom headers but no attachments.

use super::provider::{custom_headers, Capabilities, EmailTransport, ProviderError};
use crate::domain::{OutgoingEmail, Recipients, SesConfig};
use async_trait::async_trait;
use aws_sdk_sesv2::{
    config::Region,
    types::{Body, Content, Destination, EmailContent, Message, MessageHeader},
    Client,
};
use std::collections::BTreeMap;
use tokio::sync::OnceCell;

/// AWS SES email transport
///
/// The SDK client is resolved on first send (loading credentials may hit the
/// network) and reused afterwards. Concurrent first sends share one
/// initialization.
pub struct SesTransport {
    config: SesConfig,
    client: OnceCell<Client>,
}

impl SesTransport {
    pub fn new(config: SesConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Use a preconfigured SDK client instead of resolving one lazily
    pub fn with_client(config: SesConfig, client: Client) -> Self {
        Self {
            config,
            client: OnceCell::new_with(Some(client)),
        }
    }

    async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| async {
                let region = Region::new(self.config.region.clone());

                let sdk_config = if let (Some(access_key), Some(secret_key)) =
                    (&self.config.access_key_id, &self.config.secret_access_key)
                {
                    let credentials = aws_sdk_sesv2::config::Credentials::new(
                        access_key.clone(),
                        secret_key.clone(),
                        None, // session token
                        None, // expiration
                        "mailmux-ses",
                    );

                    aws_config::from_env()
                        .region(region)
                        .credentials_provider(credentials)
                        .load()
                        .await
                } else {
                    // Default credential chain (IAM role, env vars, etc.)
                    aws_config::from_env().region(region).load().await
                };

                tracing::debug!(region = %self.config.region, "Resolved SES client");
                Client::new(&sdk_config)
            })
            .await
    }
}

fn utf8_content(data: &str) -> Result<Content, ProviderError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| ProviderError::InvalidConfiguration(e.to_string()))
}

fn addresses(recipients: Option<&Recipients>) -> Option<Vec<String>> {
    recipients
        .filter(|r| !r.is_empty())
        .map(Recipients::to_strings)
}

fn message_headers(
    headers: &BTreeMap<String, String>,
) -> Result<Option<Vec<MessageHeader>>, ProviderError> {
    let headers = custom_headers(headers)
        .map(|(name, value)| {
            MessageHeader::builder()
                .name(name)
                .value(value)
                .build()
                .map_err(|e| ProviderError::InvalidConfiguration(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(headers).filter(|h| !h.is_empty()))
}

fn classify_error(error_msg: String) -> ProviderError {
    if error_msg.contains("AccessDenied")
        || error_msg.contains("InvalidClientTokenId")
        || error_msg.contains("SignatureDoesNotMatch")
    {
        ProviderError::AuthenticationFailed(error_msg)
    } else if error_msg.contains("Throttling") || error_msg.contains("rate") {
        ProviderError::RateLimited
    } else if error_msg.contains("connection") || error_msg.contains("timeout") {
        ProviderError::ConnectionError(error_msg)
    } else {
        ProviderError::SendFailed(error_msg)
    }
}

#[async_trait]
impl EmailTransport for SesTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ProviderError> {
        if email.to.is_empty() {
            return Err(ProviderError::InvalidConfiguration(
                "No recipients specified".to_string(),
            ));
        }

        let destination = Destination::builder()
            .set_to_addresses(Some(email.to.to_strings()))
            .set_cc_addresses(addresses(email.cc.as_ref()))
            .set_bcc_addresses(addresses(email.bcc.as_ref()))
            .build();

        let mut body_builder = Body::builder().html(utf8_content(&email.html_body)?);
        if let Some(text) = &email.text_body {
            body_builder = body_builder.text(utf8_content(text)?);
        }

        let ses_message = Message::builder()
            .subject(utf8_content(&email.subject)?)
            .body(body_builder.build())
            .set_headers(message_headers(&email.headers)?)
            .build();

        let mut request = self
            .client()
            .await
            .send_email()
            .from_email_address(email.sender.to_string())
            .destination(destination)
            .set_reply_to_addresses(addresses(email.reply_to.as_ref()))
            .content(EmailContent::builder().simple(ses_message).build());

        if let Some(config_set) = &self.config.configuration_set {
            request = request.configuration_set_name(config_set);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_error(e.to_string()))?;

        tracing::debug!(message_id = ?response.message_id, "SES accepted message");
        Ok(())
    }

    fn provider_kind(&self) -> &'static str {
        "ses"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::without_attachments()
    }
}
