//! Prometheus metrics for the signer.
//!
//! All metrics are aggregated in the [`Metrics`] struct for easy tracking and management.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Aggregated metrics for the signer.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        describe_counter!(
            "signer_sign_requests_total",
            "Total number of signing requests submitted to the custody service"
        );
        describe_counter!(
            "signer_sign_requests_failed_total",
            "Total number of signing requests that ended failed or rejected"
        );
        describe_histogram!(
            "signer_approval_duration_seconds",
            "Time from submission to a terminal session state, in seconds"
        );
    }

    /// Record one completed signing attempt.
    pub fn record_sign_request(&self, success: bool, duration: Duration) {
        counter!("signer_sign_requests_total").increment(1);
        histogram!("signer_approval_duration_seconds").record(duration.as_secs_f64());

        if !success {
            counter!("signer_sign_requests_failed_total").increment(1);
        }
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
