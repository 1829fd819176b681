//! Common test utilities

#![allow(dead_code)]

use mailmux::{Capabilities, FnTransport, OutgoingEmail, ProviderAdapter, ProviderError};
use std::sync::{Arc, Mutex};

/// Captures every email handed to a transport
#[derive(Clone, Default)]
pub struct Outbox {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Provider that records into this outbox and succeeds
    pub fn provider(&self, id: &str, attachments: bool) -> ProviderAdapter {
        let sent = Arc::clone(&self.sent);
        let transport = FnTransport::new("recording", capabilities(attachments), move |email| {
            let sent = Arc::clone(&sent);
            async move {
                sent.lock().unwrap().push(email);
                Ok::<(), ProviderError>(())
            }
        });
        ProviderAdapter::new(transport).with_id(id)
    }

    /// Provider that records into this outbox and then fails with `error`
    pub fn failing_provider(&self, id: &str, error: ProviderError) -> ProviderAdapter {
        let sent = Arc::clone(&self.sent);
        let transport = FnTransport::new("failing", capabilities(true), move |email| {
            let sent = Arc::clone(&sent);
            let error = error.clone();
            async move {
                sent.lock().unwrap().push(email);
                Err(error)
            }
        });
        ProviderAdapter::new(transport).with_id(id)
    }
}

fn capabilities(attachments: bool) -> Capabilities {
    if attachments {
        Capabilities::with_attachments()
    } else {
        Capabilities::without_attachments()
    }
}
