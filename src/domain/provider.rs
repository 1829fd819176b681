//! Provider configuration domain types

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Provider definition as it appears in configuration: an optional id plus
/// the provider-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderSettings {
    /// Lookup key; `"default"` when omitted
    #[serde(default)]
    pub id: Option<String>,

    #[serde(flatten)]
    pub config: ProviderConfig,
}

/// Provider configuration - supports multiple provider types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// SMTP relay
    Smtp(SmtpConfig),

    /// AWS Simple Email Service
    Ses(SesConfig),

    /// Resend HTTP API
    Resend(ResendConfig),

    /// Log-only transport for development
    Log,
}

impl ProviderConfig {
    /// Get the provider type as a string
    pub fn provider_type(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Ses(_) => "ses",
            Self::Resend(_) => "resend",
            Self::Log => "log",
        }
    }
}

/// SMTP configuration for email sending
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct SmtpConfig {
    /// SMTP server host
    #[validate(length(min = 1, max = 255))]
    pub host: String,

    /// SMTP server port (typically 587 for TLS, 465 for SSL, 25 for unencrypted)
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    pub username: Option<String>,

    pub password: Option<String>,

    #[serde(default = "default_true")]
    pub use_tls: bool,
}

/// AWS SES configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct SesConfig {
    /// AWS region (e.g., "us-east-1")
    #[validate(length(min = 1, max = 50))]
    pub region: String,

    /// AWS access key ID (optional - uses the default credential chain if not provided)
    pub access_key_id: Option<String>,

    pub secret_access_key: Option<String>,

    /// Configuration set name (optional, for tracking)
    pub configuration_set: Option<String>,
}

/// Resend API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct ResendConfig {
    /// API key; when absent it is read from `api_key_env` on first send
    pub api_key: Option<String>,

    #[serde(default = "default_resend_key_env")]
    #[validate(length(min = 1))]
    pub api_key_env: String,

    #[serde(default = "default_resend_base_url")]
    #[validate(url)]
    pub base_url: String,
}

impl Default for ResendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_resend_key_env(),
            base_url: default_resend_base_url(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_smtp_port() -> u16 {
    587
}

fn default_resend_key_env() -> String {
    "RESEND_API_KEY".to_string()
}

fn default_resend_base_url() -> String {
    "https://api.resend.com".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_settings_deserialization() {
        let json = r#"[
            {"type": "smtp", "host": "smtp.example.com"},
            {"id": "promo", "type": "resend", "api_key": "re_123"},
            {"id": "bulk", "type": "ses", "region": "us-east-1"},
            {"id": "dev", "type": "log"}
        ]"#;
        let settings: Vec<ProviderSettings> = serde_json::from_str(json).unwrap();

        assert_eq!(settings.len(), 4);
        assert!(settings[0].id.is_none());
        match &settings[0].config {
            ProviderConfig::Smtp(smtp) => {
                assert_eq!(smtp.port, 587);
                assert!(smtp.use_tls);
            }
            other => panic!("Expected SMTP config, got {:?}", other),
        }
        assert_eq!(settings[1].id.as_deref(), Some("promo"));
        match &settings[1].config {
            ProviderConfig::Resend(resend) => {
                assert_eq!(resend.base_url, "https://api.resend.com");
                assert_eq!(resend.api_key_env, "RESEND_API_KEY");
            }
            other => panic!("Expected Resend config, got {:?}", other),
        }
        assert_eq!(settings[2].config.provider_type(), "ses");
        assert_eq!(settings[3].config, ProviderConfig::Log);
    }

    #[test]
    fn test_provider_config_serialization() {
        let config = ProviderConfig::Smtp(SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 2525,
            username: None,
            password: None,
            use_tls: false,
        });

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"type\":\"smtp\""));

        let parsed: ProviderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_resend_config_validation() {
        assert!(ResendConfig::default().validate().is_ok());

        let config = ResendConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_smtp_config_validation() {
        let config = SmtpConfig {
            host: String::new(),
            port: 587,
            username: None,
            password: None,
            use_tls: true,
        };
        assert!(config.validate().is_err());
    }
}
