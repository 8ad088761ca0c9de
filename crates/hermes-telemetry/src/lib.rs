//! Logging and metrics for Hermes.
//!
//! - **Logging**: [`init_logging`] installs a `tracing-subscriber` registry
//!   with JSON or pretty output.
//! - **Metrics**: [`record_request`] feeds the `metrics` facade;
//!   [`init_metrics`] installs a Prometheus recorder.
//!
//! Both are optional: the dispatcher logs through `tracing` and records
//! through `metrics` whether or not anything is installed.

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use self::error::TelemetryError;
pub use self::logging::{create_env_filter, init_logging, LogConfig, LogFormat};
pub use self::metrics::{
    init_metrics, record_error, record_request, render_metrics, InFlightGuard, MetricsConfig,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
