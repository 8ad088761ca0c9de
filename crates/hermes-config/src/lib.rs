//! Layered configuration for Hermes.
//!
//! [`HermesConfig`] gathers everything an application needs at startup:
//!
//! - `server` - listener address, timeouts and body limit
//! - `routing` - route prefix, development mode, error handling and
//!   serialization switches, templates
//! - `logging` - [`LogConfig`](hermes_telemetry::LogConfig)
//! - `metrics` - [`MetricsConfig`](hermes_telemetry::MetricsConfig)
//!
//! [`ConfigLoader`] builds one from a preset, TOML or JSON files, `.env`
//! files and `HERMES__SECTION__KEY` environment variables. Unknown fields
//! in files are errors.
//!
//! # File format
//!
//! ```toml
//! [server]
//! addr = "0.0.0.0:3000"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! body_limit = 2097152
//!
//! [routing]
//! route_prefix = "/api"
//! default_error_handler = true
//! template_dir = "templates"
//!
//! [routing.error_overriding_map.NotFoundError]
//! message = "Nothing here"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{
    development_mode_from_env, is_development_mode, HermesConfig, RoutingSection,
    ServerSection, MODE_ENV_VAR,
};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use hermes_telemetry::{LogConfig, LogFormat, MetricsConfig};
