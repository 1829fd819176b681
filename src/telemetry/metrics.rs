//! Prometheus metrics setup and metric definitions

use crate::error::SendError;
use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub const EMAILS_TOTAL: &str = "mailmux_emails_total";
pub const SEND_DURATION_SECONDS: &str = "mailmux_send_duration_seconds";

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    // Provider round trips range from a local relay (ms) to slow HTTP APIs (s)
    let buckets = vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register metric descriptions so HELP/TYPE lines appear from startup.
pub fn describe_metrics() {
    describe_counter!(
        EMAILS_TOTAL,
        "Total number of send attempts by provider and outcome"
    );
    describe_histogram!(
        SEND_DURATION_SECONDS,
        "Time spent in provider transports, in seconds"
    );
}

fn status_label(result: &std::result::Result<(), SendError>) -> &'static str {
    match result {
        Ok(()) => "success",
        Err(error) => error.kind(),
    }
}

/// Record the outcome of a dispatch that resolved a provider
pub fn record_send(provider: &str, result: &std::result::Result<(), SendError>) {
    counter!(
        EMAILS_TOTAL,
        "provider" => provider.to_string(),
        "status" => status_label(result)
    )
    .increment(1);
}

/// Record time spent inside a provider transport
pub fn record_transport_duration(provider: &str, elapsed: Duration) {
    histogram!(SEND_DURATION_SECONDS, "provider" => provider.to_string())
        .record(elapsed.as_secs_f64());
}

/// Record a dispatch rejected before any transport was selected
pub fn record_rejected(provider: &str, error: &SendError) {
    counter!(
        EMAILS_TOTAL,
        "provider" => provider.to_string(),
        "status" => error.kind()
    )
    .increment(1);
}
