//! Builds provider adapters from declarative configuration

use super::log::LogTransport;
use super::provider::{EmailTransport, ProviderAdapter, ProviderError};
use super::resend::ResendTransport;
use super::ses::SesTransport;
use super::smtp::SmtpTransport;
use crate::domain::{ProviderConfig, ProviderSettings};
use crate::error::ConfigError;
use std::sync::Arc;
use validator::Validate;

/// Factory for building an [`EmailTransport`] from configuration.
///
/// This indirection keeps tests hermetic: they can swap in transports that
/// never touch the network.
#[cfg_attr(test, mockall::automock)]
pub trait TransportFactory: Send + Sync {
    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn EmailTransport>, ProviderError>;
}

/// Factory for the built-in providers
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTransportFactory;

fn validated<T: Validate>(config: &T) -> Result<(), ProviderError> {
    config
        .validate()
        .map_err(|e| ProviderError::InvalidConfiguration(e.to_string()))
}

impl TransportFactory for DefaultTransportFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn EmailTransport>, ProviderError> {
        match config {
            ProviderConfig::Smtp(smtp) => {
                validated(smtp)?;
                Ok(Arc::new(SmtpTransport::from_config(smtp)?))
            }
            ProviderConfig::Ses(ses) => {
                validated(ses)?;
                Ok(Arc::new(SesTransport::new(ses.clone())))
            }
            ProviderConfig::Resend(resend) => {
                validated(resend)?;
                Ok(Arc::new(ResendTransport::new(resend.clone())?))
            }
            ProviderConfig::Log => Ok(Arc::new(LogTransport::new())),
        }
    }
}

/// Create a registered adapter for one provider entry
pub fn build_adapter(
    factory: &dyn TransportFactory,
    settings: &ProviderSettings,
) -> Result<ProviderAdapter, ConfigError> {
    let provider_type = settings.config.provider_type();
    let transport = factory.create(&settings.config).map_err(|e| {
        tracing::warn!(provider_type, error = %e, "Failed to create email transport");
        e
    })?;
    let adapter = ProviderAdapter::from_arc(transport);
    tracing::debug!(
        provider_type,
        provider_id = settings.id.as_deref().unwrap_or("default"),
        "Created email transport"
    );

    Ok(match &settings.id {
        Some(id) => adapter.with_id(id.clone()),
        None => adapter,
    })
}
