//! Prometheus metrics setup and metric definitions

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    // Seconds; sub-millisecond buckets cover the token-cache fast path.
    let buckets = [
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register metric descriptions and emit initial zero values so Prometheus output
/// includes HELP/TYPE lines for all metrics from startup.
pub fn describe_metrics() {
    // HTTP metrics
    describe_counter!(
        "ridercritic_http_requests_total",
        "Total number of HTTP requests"
    );
    describe_histogram!(
        "ridercritic_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "ridercritic_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    // Identity provider
    describe_counter!(
        "ridercritic_provider_requests_total",
        "Identity provider calls by operation and outcome"
    );

    // Auth
    describe_counter!(
        "ridercritic_auth_gate_total",
        "Bearer gate decisions by gate and outcome"
    );
    describe_counter!("ridercritic_logins_total", "Login attempts by outcome");
    describe_counter!(
        "ridercritic_registrations_total",
        "Accounts created through registration"
    );

    counter!("ridercritic_logins_total", "outcome" => "success").absolute(0);
    counter!("ridercritic_logins_total", "outcome" => "rejected").absolute(0);
    counter!("ridercritic_registrations_total").absolute(0);
    counter!("ridercritic_auth_gate_total", "gate" => "auth", "outcome" => "allowed").absolute(0);
    counter!("ridercritic_auth_gate_total", "gate" => "admin", "outcome" => "denied").absolute(0);
}
