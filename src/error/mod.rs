//! Unified error handling for Mailmux

use crate::email::ProviderError;
use serde::Serialize;
use thiserror::Error;

/// Result type for facade construction
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors raised while assembling a mailer.
///
/// These never reach send time: a mailer either builds from a valid
/// configuration or does not exist at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("must provide at least one provider")]
    NoProviders,

    #[error("must provide at least one sender")]
    NoSenders,

    #[error("duplicate provider id: {0}")]
    DuplicateProvider(String),

    #[error("duplicate sender id: {0}")]
    DuplicateSender(String),

    #[error("invalid sender: {0}")]
    InvalidSender(String),

    #[error("provider setup failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Failures produced by dispatching a single send.
///
/// Always carried as data by the dispatch core. Strict mailers return it as
/// `Err`, safe mailers wrap it in [`SendOutcome::Failure`](crate::domain::SendOutcome).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum SendError {
    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    #[error("sender not found: {0}")]
    SenderNotFound(String),

    #[error("provider {0} does not support attachments")]
    AttachmentsNotSupported(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl SendError {
    /// Short machine-readable label, used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProviderNotFound(_) => "provider_not_found",
            Self::SenderNotFound(_) => "sender_not_found",
            Self::AttachmentsNotSupported(_) => "attachments_not_supported",
            Self::Provider(_) => "provider_error",
        }
    }
}

impl From<validator::ValidationErrors> for ConfigError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ConfigError::InvalidSender(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::NoProviders.to_string(),
            "must provide at least one provider"
        );
        assert_eq!(
            ConfigError::NoSenders.to_string(),
            "must provide at least one sender"
        );
        assert_eq!(
            ConfigError::DuplicateProvider("promo".to_string()).to_string(),
            "duplicate provider id: promo"
        );
    }

    #[test]
    fn test_provider_error_is_transparent() {
        let err: SendError = ProviderError::SendFailed("mailbox full".to_string()).into();
        assert_eq!(err.to_string(), "Send failed: mailbox full");
        assert_eq!(err.kind(), "provider_error");
    }

    #[test]
    fn test_send_error_serialization() {
        let err = SendError::AttachmentsNotSupported("ses".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "attachments_not_supported", "detail": "ses"})
        );

        let err = SendError::Provider(ProviderError::RateLimited);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "provider");
        assert_eq!(json["detail"]["type"], "rate_limited");
    }
}
