//! Configuration management for Mailmux

use crate::domain::{ProviderSettings, SenderConfig};
use anyhow::{Context, Result};
use std::env;

/// Mailer configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Provider definitions, in registration order
    pub providers: Vec<ProviderSettings>,
    /// Sender definitions, in registration order
    pub senders: Vec<SenderConfig>,
    /// Return failures as values instead of errors
    pub safe: bool,
    /// Telemetry configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "json" or "pretty"
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            metrics_enabled: false,
        }
    }
}

fn parse_bool(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be true or false", name)),
        _ => Ok(default),
    }
}

fn parse_json_list<T: serde::de::DeserializeOwned>(name: &str) -> Result<Vec<T>> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            serde_json::from_str(&value).with_context(|| format!("{} is not a valid JSON list", name))
        }
        _ => Ok(Vec::new()),
    }
}

impl MailerConfig {
    /// Load configuration from environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            providers: parse_json_list("MAILMUX_PROVIDERS")?,
            senders: parse_json_list("MAILMUX_SENDERS")?,
            safe: parse_bool("MAILMUX_SAFE_MODE", false)?,
            telemetry: TelemetryConfig {
                log_format: env::var("MAILMUX_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
                metrics_enabled: parse_bool("MAILMUX_METRICS_ENABLED", false)?,
            },
        })
    }
}
