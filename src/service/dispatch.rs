//! Dispatch core: resolves provider and sender for a request, enforces
//! provider capabilities and hands the email to the provider transport.

use crate::domain::{EmailRequest, OutgoingEmail, Sender, DEFAULT_ID};
use crate::email::ProviderAdapter;
use crate::error::{ConfigError, SendError};
use crate::telemetry::metrics;
use std::time::Instant;

/// Validated, immutable set of providers and senders a mailer dispatches over.
///
/// Provider ids are pairwise unique, sender ids are pairwise unique and
/// neither list is empty.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    providers: Vec<ProviderAdapter>,
    senders: Vec<Sender>,
    safe: bool,
}

/// First id that appears again later in the sequence
fn first_duplicate<'a>(ids: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let ids: Vec<&str> = ids.into_iter().collect();
    ids.iter()
        .enumerate()
        .find(|&(i, id)| ids[i + 1..].contains(id))
        .map(|(_, id)| *id)
}

/// Explicit id must match exactly. Without one (or with `"default"`), the
/// `"default"` entry wins, then the first registered entry.
fn resolve<'a, T>(
    entries: &'a [T],
    requested: Option<&str>,
    id_of: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    match requested {
        Some(id) if id != DEFAULT_ID => entries.iter().find(|entry| id_of(*entry) == id),
        _ => entries
            .iter()
            .find(|entry| id_of(*entry) == DEFAULT_ID)
            .or_else(|| entries.first()),
    }
}

impl DispatchConfig {
    pub fn new(
        providers: Vec<ProviderAdapter>,
        senders: Vec<Sender>,
        safe: bool,
    ) -> Result<Self, ConfigError> {
        if providers.is_empty() {
            return Err(ConfigError::NoProviders);
        }
        if senders.is_empty() {
            return Err(ConfigError::NoSenders);
        }
        if let Some(id) = first_duplicate(providers.iter().map(ProviderAdapter::id)) {
            return Err(ConfigError::DuplicateProvider(id.to_string()));
        }
        if let Some(id) = first_duplicate(senders.iter().map(Sender::id)) {
            return Err(ConfigError::DuplicateSender(id.to_string()));
        }

        Ok(Self {
            providers,
            senders,
            safe,
        })
    }

    pub fn providers(&self) -> &[ProviderAdapter] {
        &self.providers
    }

    pub fn senders(&self) -> &[Sender] {
        &self.senders
    }

    /// Whether failures are returned as [`SendOutcome`](crate::domain::SendOutcome) values
    pub fn safe(&self) -> bool {
        self.safe
    }

    pub fn resolve_provider(&self, requested: Option<&str>) -> Result<&ProviderAdapter, SendError> {
        resolve(&self.providers, requested, ProviderAdapter::id).ok_or_else(|| {
            SendError::ProviderNotFound(requested.unwrap_or(DEFAULT_ID).to_string())
        })
    }

    pub fn resolve_sender(&self, requested: Option<&str>) -> Result<&Sender, SendError> {
        resolve(&self.senders, requested, Sender::id).ok_or_else(|| {
            SendError::SenderNotFound(requested.unwrap_or(DEFAULT_ID).to_string())
        })
    }

    /// Send one request. Every failure comes back as data; nothing is retried
    /// and the configuration is left untouched for later calls.
    pub async fn dispatch(&self, request: EmailRequest) -> Result<(), SendError> {
        let provider = match self.resolve_provider(request.provider.as_deref()) {
            Ok(provider) => provider,
            Err(error) => {
                tracing::warn!(requested = ?request.provider, "Email provider not found");
                metrics::record_rejected("unresolved", &error);
                return Err(error);
            }
        };

        let result = self.send_via(provider, request).await;
        metrics::record_send(provider.id(), &result);

        match &result {
            Ok(()) => tracing::info!(provider = provider.id(), "Email sent"),
            Err(error) => tracing::warn!(
                provider = provider.id(),
                kind = error.kind(),
                "Email send failed: {}",
                error
            ),
        }

        result
    }

    async fn send_via(
        &self,
        provider: &ProviderAdapter,
        request: EmailRequest,
    ) -> Result<(), SendError> {
        if request.has_attachments() && !provider.supports_attachments() {
            return Err(SendError::AttachmentsNotSupported(provider.id().to_string()));
        }

        let sender = self.resolve_sender(request.from.as_deref())?;

        tracing::debug!(
            provider = provider.id(),
            provider_kind = provider.kind(),
            sender = sender.id(),
            recipients = request.to.len(),
            "Resolved provider and sender"
        );

        let email = OutgoingEmail::from_request(sender.clone(), request);
        let started = Instant::now();
        let result = provider.send(&email).await;
        metrics::record_transport_duration(provider.id(), started.elapsed());
        result?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Attachment;
    use crate::email::provider::MockEmailTransport;
    use crate::email::{Capabilities, ProviderError};
    use rstest::rstest;

    fn mock_adapter(id: &str, attachments: bool) -> ProviderAdapter {
        let mut mock = MockEmailTransport::new();
        mock.expect_provider_kind().return_const("mock");
        mock.expect_capabilities().returning(move || Capabilities {
            supports_attachments: attachments,
        });
        mock.expect_send().returning(|_| Ok(()));
        ProviderAdapter::new(mock).with_id(id)
    }

    fn config(provider_ids: &[&str], sender_ids: &[&str]) -> DispatchConfig {
        DispatchConfig::new(
            provider_ids.iter().map(|id| mock_adapter(id, false)).collect(),
            sender_ids
                .iter()
                .map(|id| Sender::with_id(*id, "Acme", format!("{}@acme.test", id)))
                .collect(),
            false,
        )
        .unwrap()
    }

    fn request() -> EmailRequest {
        EmailRequest::new("x@y.com", "hi", "<p>hi</p>")
    }

    #[test]
    fn test_first_duplicate() {
        assert_eq!(first_duplicate(["a", "b", "c"]), None);
        assert_eq!(first_duplicate(["a", "b", "a", "b"]), Some("a"));
        assert_eq!(first_duplicate(["a", "b", "c", "b", "a"]), Some("a"));
        assert_eq!(first_duplicate(["a", "b", "c", "c"]), Some("c"));
    }

    #[test]
    fn test_config_validation() {
        let err = DispatchConfig::new(vec![], vec![Sender::new("A", "a@a.test")], false);
        assert_eq!(err.unwrap_err(), ConfigError::NoProviders);

        let err = DispatchConfig::new(vec![mock_adapter("default", false)], vec![], false);
        assert_eq!(err.unwrap_err(), ConfigError::NoSenders);

        let err = DispatchConfig::new(
            vec![
                mock_adapter("a", false),
                mock_adapter("b", false),
                mock_adapter("b", false),
            ],
            vec![Sender::new("A", "a@a.test")],
            false,
        );
        assert_eq!(
            err.unwrap_err(),
            ConfigError::DuplicateProvider("b".to_string())
        );

        let err = DispatchConfig::new(
            vec![mock_adapter("default", false)],
            vec![Sender::new("A", "a@a.test"), Sender::new("B", "b@b.test")],
            false,
        );
        assert_eq!(
            err.unwrap_err(),
            ConfigError::DuplicateSender("default".to_string())
        );
    }

    #[rstest]
    #[case(&["promo", "default"], None, "default")]
    #[case(&["promo", "default"], Some("default"), "default")]
    #[case(&["promo", "bulk"], None, "promo")]
    #[case(&["promo", "bulk"], Some("default"), "promo")]
    #[case(&["promo", "bulk"], Some("bulk"), "bulk")]
    fn test_resolve_provider(
        #[case] ids: &[&str],
        #[case] requested: Option<&str>,
        #[case] expected: &str,
    ) {
        let config = config(ids, &["default"]);
        let provider = config.resolve_provider(requested).unwrap();
        assert_eq!(provider.id(), expected);
    }

    #[rstest]
    #[case(&["support", "default"], None, "default")]
    #[case(&["support", "billing"], None, "support")]
    #[case(&["support", "billing"], Some("billing"), "billing")]
    fn test_resolve_sender(
        #[case] ids: &[&str],
        #[case] requested: Option<&str>,
        #[case] expected: &str,
    ) {
        let config = config(&["default"], ids);
        let sender = config.resolve_sender(requested).unwrap();
        assert_eq!(sender.id(), expected);
    }

    #[test]
    fn test_unknown_ids_fail() {
        let config = config(&["default"], &["default"]);
        assert_eq!(
            config.resolve_provider(Some("missing")).unwrap_err(),
            SendError::ProviderNotFound("missing".to_string())
        );
        assert_eq!(
            config.resolve_sender(Some("nobody")).unwrap_err(),
            SendError::SenderNotFound("nobody".to_string())
        );
    }

    #[tokio::test]
    async fn test_dispatch_passes_resolved_sender_to_transport() {
        let mut mock = MockEmailTransport::new();
        mock.expect_provider_kind().return_const("mock");
        mock.expect_capabilities().returning(Capabilities::default);
        mock.expect_send()
            .withf(|email| email.sender.id() == "support" && email.subject == "hi")
            .times(1)
            .returning(|_| Ok(()));

        let config = DispatchConfig::new(
            vec![ProviderAdapter::new(mock)],
            vec![
                Sender::new("Acme", "hello@acme.test"),
                Sender::with_id("support", "Acme Support", "support@acme.test"),
            ],
            false,
        )
        .unwrap();

        let result = config.dispatch(request().with_from("support")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_rejects_attachments_before_transport() {
        let mut mock = MockEmailTransport::new();
        mock.expect_provider_kind().return_const("mock");
        mock.expect_capabilities().returning(Capabilities::without_attachments);
        mock.expect_send().times(1).returning(|_| Ok(()));

        let config = DispatchConfig::new(
            vec![ProviderAdapter::new(mock).with_id("plain")],
            vec![Sender::new("Acme", "hello@acme.test")],
            false,
        )
        .unwrap();

        let with_attachment =
            request().with_attachment(Attachment::new("a.txt", b"data".to_vec()));
        assert_eq!(
            config.dispatch(with_attachment).await,
            Err(SendError::AttachmentsNotSupported("plain".to_string()))
        );

        // The same request without attachments reaches the transport exactly once
        assert!(config.dispatch(request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_passes_transport_error_through() {
        let mut mock = MockEmailTransport::new();
        mock.expect_provider_kind().return_const("mock");
        mock.expect_capabilities().returning(Capabilities::default);
        mock.expect_send()
            .returning(|_| Err(ProviderError::SendFailed("mailbox full".to_string())));

        let config = DispatchConfig::new(
            vec![ProviderAdapter::new(mock)],
            vec![Sender::new("Acme", "hello@acme.test")],
            false,
        )
        .unwrap();

        assert_eq!(
            config.dispatch(request()).await,
            Err(SendError::Provider(ProviderError::SendFailed(
                "mailbox full".to_string()
            )))
        );
        // Configuration stays usable after a failure
        assert_eq!(config.providers().len(), 1);
        assert!(config.dispatch(request()).await.is_err());
    }

    #[test]
    fn test_duration_recorded_only_around_transport() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        let mut mock = MockEmailTransport::new();
        mock.expect_provider_kind().return_const("mock");
        mock.expect_capabilities().returning(Capabilities::without_attachments);
        mock.expect_send().times(1).returning(|_| Ok(()));

        let config = DispatchConfig::new(
            vec![ProviderAdapter::new(mock).with_id("plain")],
            vec![Sender::new("Acme", "hello@acme.test")],
            false,
        )
        .unwrap();

        let with_attachment =
            request().with_attachment(Attachment::new("a.txt", b"data".to_vec()));
        let rejected = ::metrics::with_local_recorder(&recorder, || {
            crate::telemetry::metrics::describe_metrics();
            runtime.block_on(config.dispatch(with_attachment))
        });
        assert!(rejected.is_err());

        let rendered = handle.render();
        assert!(rendered.contains(r#"provider="plain",status="attachments_not_supported"} 1"#));
        assert!(!rendered.contains(crate::telemetry::metrics::SEND_DURATION_SECONDS));

        let sent = ::metrics::with_local_recorder(&recorder, || {
            runtime.block_on(config.dispatch(request()))
        });
        assert!(sent.is_ok());

        let rendered = handle.render();
        assert!(rendered.contains(r#"provider="plain",status="success"} 1"#));
        assert!(rendered.contains(crate::telemetry::metrics::SEND_DURATION_SECONDS));
        assert!(!rendered.contains(r#"provider="default""#));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_provider_skips_transport() {
        let mut mock = MockEmailTransport::new();
        mock.expect_provider_kind().return_const("mock");
        mock.expect_capabilities().returning(Capabilities::default);
        mock.expect_send().never();

        let config = DispatchConfig::new(
            vec![ProviderAdapter::new(mock)],
            vec![Sender::new("Acme", "hello@acme.test")],
            true,
        )
        .unwrap();

        assert!(config.safe());
        assert_eq!(
            config.dispatch(request().with_provider("promo")).await,
            Err(SendError::ProviderNotFound("promo".to_string()))
        );
    }
}
