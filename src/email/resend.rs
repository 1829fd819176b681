//! Resend HTTP API transport

use super::provider::{custom_headers, Capabilities, EmailTransport, ProviderError};
use crate::domain::{OutgoingEmail, Recipients, ResendConfig};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Transport for the Resend `/emails` endpoint.
///
/// When no API key is configured it is read from the environment on first
/// send and cached for the transport's lifetime.
pub struct ResendTransport {
    config: ResendConfig,
    http_client: Client,
    api_key: OnceCell<String>,
}

#[derive(Debug, Serialize)]
struct ResendAttachment<'a> {
    filename: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ResendPayload<'a> {
    from: String,
    to: Vec<String>,
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cc: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bcc: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<&'a str, &'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ResendAttachment<'a>>,
}

impl<'a> ResendPayload<'a> {
    fn from_email(email: &'a OutgoingEmail) -> Self {
        let list = |r: Option<&Recipients>| {
            r.filter(|r| !r.is_empty()).map(Recipients::to_strings)
        };

        Self {
            from: email.sender.to_string(),
            to: email.to.to_strings(),
            subject: &email.subject,
            html: &email.html_body,
            text: email.text_body.as_deref(),
            cc: list(email.cc.as_ref()),
            bcc: list(email.bcc.as_ref()),
            reply_to: list(email.reply_to.as_ref()),
            headers: custom_headers(&email.headers).collect(),
            attachments: email
                .attachments
                .iter()
                .map(|a| ResendAttachment {
                    filename: &a.filename,
                    content: STANDARD.encode(&a.content),
                    content_type: a.content_type.as_deref(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

impl ResendTransport {
    pub fn new(config: ResendConfig) -> Result<Self, ProviderError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::InvalidConfiguration(e.to_string()))?;

        let api_key = OnceCell::new_with(config.api_key.clone());

        Ok(Self {
            config,
            http_client,
            api_key,
        })
    }

    async fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .get_or_try_init(|| async {
                std::env::var(&self.config.api_key_env)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .ok_or(ProviderError::NotConfigured)
            })
            .await
            .map(String::as_str)
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmailTransport for ResendTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ProviderError> {
        if email.to.is_empty() {
            return Err(ProviderError::InvalidConfiguration(
                "No recipients specified".to_string(),
            ));
        }

        let api_key = self.api_key().await?;
        let payload = ResendPayload::from_email(email);

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderError::AuthenticationFailed(body)
                }
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
                _ => ProviderError::Rejected {
                    status: status.as_u16(),
                    message: body,
                },
            });
        }

        let sent: ResendResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::SendFailed(format!("Failed to parse response: {}", e)))?;

        tracing::debug!(message_id = %sent.id, "Resend accepted message");
        Ok(())
    }

    fn provider_kind(&self) -> &'static str {
        "resend"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::with_attachments()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Attachment, EmailRequest, Sender};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let request = EmailRequest::new("to@example.com", "Hi", "<p>Hi</p>")
            .with_text_body("Hi")
            .with_bcc(["x@example.com", "y@example.com"])
            .with_header("X-Entity-Ref-ID", "42")
            .with_header("From", "evil@example.com")
            .with_attachment(Attachment::new("a.txt", b"hello".to_vec()));
        let email =
            OutgoingEmail::from_request(Sender::new("Acme", "hello@acme.test"), request);

        let payload = serde_json::to_value(ResendPayload::from_email(&email)).unwrap();
        assert_eq!(
            payload,
            json!({
                "from": "Acme <hello@acme.test>",
                "to": ["to@example.com"],
                "subject": "Hi",
                "html": "<p>Hi</p>",
                "text": "Hi",
                "bcc": ["x@example.com", "y@example.com"],
                "headers": {"X-Entity-Ref-ID": "42"},
                "attachments": [{"filename": "a.txt", "content": "aGVsbG8="}]
            })
        );
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let transport = ResendTransport::new(ResendConfig {
            api_key: Some("re_test".to_string()),
            base_url: "http://localhost:9999/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(transport.endpoint(), "http://localhost:9999/emails");
        assert!(transport.capabilities().supports_attachments);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_not_configured() {
        let transport = ResendTransport::new(ResendConfig {
            api_key: None,
            api_key_env: "MAILMUX_TEST_RESEND_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(transport.api_key().await, Err(ProviderError::NotConfigured));
    }
}
