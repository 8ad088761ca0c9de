//! Request metrics.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `hermes_requests_total` | Counter | `method`, `route`, `status` |
//! | `hermes_request_duration_seconds` | Histogram | `method`, `route` |
//! | `hermes_in_flight_requests` | Gauge | - |
//! | `hermes_handler_errors_total` | Counter | `error` |
//!
//! Recording works without an installed recorder; the values are dropped.

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use serde::{Deserialize, Serialize};

use crate::error::TelemetryError;
use crate::TelemetryResult;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const REQUESTS_TOTAL: &str = "hermes_requests_total";
const REQUEST_DURATION: &str = "hermes_request_duration_seconds";
const IN_FLIGHT: &str = "hermes_in_flight_requests";
const HANDLER_ERRORS: &str = "hermes_handler_errors_total";

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install a Prometheus recorder.
    pub enabled: bool,
    /// Scrape listener address; without one, metrics are only rendered on demand.
    pub addr: Option<String>,
    /// Buckets for the request duration histogram, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: None,
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder.
///
/// With an address, a scrape listener is started on the current tokio
/// runtime. Without one, [`render_metrics`] returns the text exposition.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    match &config.addr {
        Some(addr) => {
            let addr: SocketAddr = addr
                .parse()
                .map_err(|e| TelemetryError::InvalidAddress(format!("{addr}: {e}")))?;
            builder
                .with_http_listener(addr)
                .install()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        }
        None => {
            let handle = builder
                .install_recorder()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            let _ = METRICS_HANDLE.set(handle);
        }
    }

    describe_metrics();
    Ok(())
}

/// Renders the Prometheus text exposition, if a local recorder is installed.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of dispatched requests");
    describe_histogram!(REQUEST_DURATION, "Request dispatch duration in seconds");
    describe_gauge!(IN_FLIGHT, "Requests currently being dispatched");
    describe_counter!(HANDLER_ERRORS, "Requests that ended on the error path");
}

/// Records a completed request.
///
/// `route` is the matched route pattern, not the raw path, to keep label
/// cardinality bounded.
pub fn record_request(method: &str, route: &str, status: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION,
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a request that ended with `error`.
pub fn record_error(error: &str) {
    counter!(HANDLER_ERRORS, "error" => error.to_string()).increment(1);
}

/// Tracks one in-flight request until dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT).decrement(1.0);
    }
}
