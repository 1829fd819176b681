//! Named sender identities

use super::email::EmailAddress;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Identifier used when a provider or sender is registered without one.
pub const DEFAULT_ID: &str = "default";

/// A reusable "from" identity: display name plus address, looked up by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sender {
    id: String,
    name: String,
    email: String,
}

impl Sender {
    /// Create a sender registered under the `"default"` id
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::with_id(DEFAULT_ID, name, email)
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }

    /// Build a sender from declarative configuration, validating the address.
    pub fn from_config(config: SenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id: config.id.unwrap_or_else(|| DEFAULT_ID.to_string()),
            name: config.name,
            email: config.email,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_ID
    }

    pub fn address(&self) -> EmailAddress {
        EmailAddress::with_name(&self.email, &self.name)
    }
}

/// Canonical `Name <address>` form
impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Sender definition as it appears in configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct SenderConfig {
    /// Lookup key; `"default"` when omitted
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub id: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(email)]
    pub email: String,
}

impl TryFrom<SenderConfig> for Sender {
    type Error = ConfigError;

    fn try_from(config: SenderConfig) -> Result<Self, Self::Error> {
        Sender::from_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_defaults_id() {
        let sender = Sender::new("Acme", "hello@acme.test");
        assert_eq!(sender.id(), "default");
        assert!(sender.is_default());
    }

    #[test]
    fn test_sender_display() {
        let sender = Sender::with_id("support", "Acme Support", "support@acme.test");
        assert_eq!(sender.to_string(), "Acme Support <support@acme.test>");
        assert!(!sender.is_default());
    }

    #[test]
    fn test_sender_address() {
        let sender = Sender::new("Acme", "hello@acme.test");
        let addr = sender.address();
        assert_eq!(addr.email, "hello@acme.test");
        assert_eq!(addr.name.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_sender_from_config() {
        let config: SenderConfig =
            serde_json::from_str(r#"{"name": "Acme", "email": "hello@acme.test"}"#).unwrap();
        let sender = Sender::try_from(config).unwrap();
        assert_eq!(sender.id(), "default");

        let config = SenderConfig {
            id: Some("billing".to_string()),
            name: "Acme Billing".to_string(),
            email: "billing@acme.test".to_string(),
        };
        let sender = Sender::from_config(config).unwrap();
        assert_eq!(sender.id(), "billing");
    }

    #[test]
    fn test_sender_config_invalid_email() {
        let config = SenderConfig {
            id: None,
            name: "Acme".to_string(),
            email: "not-an-email".to_string(),
        };
        let result = Sender::from_config(config);
        assert!(matches!(result, Err(ConfigError::InvalidSender(_))));
    }

    #[test]
    fn test_sender_config_empty_id() {
        let config = SenderConfig {
            id: Some(String::new()),
            name: "Acme".to_string(),
            email: "hello@acme.test".to_string(),
        };
        assert!(Sender::from_config(config).is_err());
    }
}
