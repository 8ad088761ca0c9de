//! Configuration schema.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use hermes_telemetry::{create_env_filter, LogConfig, MetricsConfig};

use crate::ConfigError;

/// Environment variable that selects the runtime mode.
///
/// Any value other than `production` (case-insensitive), including an
/// unset variable, means development mode.
pub const MODE_ENV_VAR: &str = "HERMES_ENV";

/// Development mode derived from [`MODE_ENV_VAR`].
#[must_use]
pub fn development_mode_from_env() -> bool {
    is_development_mode(env::var(MODE_ENV_VAR).ok().as_deref())
}

/// Development mode for a given value of [`MODE_ENV_VAR`].
#[must_use]
pub fn is_development_mode(mode: Option<&str>) -> bool {
    !matches!(mode, Some(value) if value.trim().eq_ignore_ascii_case("production"))
}

/// Root configuration.
///
/// Every section is optional in files; missing fields take their defaults
/// and unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HermesConfig {
    /// HTTP listener settings.
    pub server: ServerSection,
    /// Dispatch settings handed to the driver.
    pub routing: RoutingSection,
    /// Log subscriber settings.
    pub logging: LogConfig,
    /// Prometheus recorder settings.
    pub metrics: MetricsConfig,
}

impl HermesConfig {
    /// Verbose logging, development error bodies.
    #[must_use]
    pub fn development() -> Self {
        Self {
            routing: RoutingSection {
                development_mode: Some(true),
                ..RoutingSection::default()
            },
            logging: LogConfig::development(),
            ..Self::default()
        }
    }

    /// JSON logging, no stacks in error bodies.
    #[must_use]
    pub fn production() -> Self {
        Self {
            routing: RoutingSection {
                development_mode: Some(false),
                ..RoutingSection::default()
            },
            logging: LogConfig::production(),
            ..Self::default()
        }
    }

    /// Development mode: the explicit setting, else [`MODE_ENV_VAR`].
    #[must_use]
    pub fn development_mode(&self) -> bool {
        self.routing
            .development_mode
            .unwrap_or_else(development_mode_from_env)
    }

    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.routing.validate()?;

        create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        if let Some(addr) = &self.metrics.addr {
            addr.parse::<SocketAddr>()
                .map_err(|e| ConfigError::invalid_value("metrics.addr", e.to_string()))?;
        }
        if self.metrics.duration_buckets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::invalid_value(
                "metrics.duration_buckets",
                "buckets must be strictly increasing",
            ));
        }
        Ok(())
    }
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Listen address.
    pub addr: String,
    /// Grace period for in-flight requests on shutdown.
    pub shutdown_timeout_secs: u64,
    /// Per-request handler timeout.
    pub request_timeout_ms: u64,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
    /// HTTP/1.1 keep-alive.
    pub keep_alive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3000".to_string(),
            shutdown_timeout_secs: 30,
            request_timeout_ms: 30_000,
            body_limit: 2 * 1024 * 1024,
            keep_alive: true,
        }
    }
}

impl ServerSection {
    fn validate(&self) -> Result<(), ConfigError> {
        self.addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid_value("server.addr", e.to_string()))?;
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.body_limit == 0 {
            return Err(ConfigError::invalid_value(
                "server.body_limit",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// `[routing]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingSection {
    /// Literal prefix joined in front of every route.
    pub route_prefix: Option<String>,
    /// Stacks in error bodies. Unset means "ask `HERMES_ENV`".
    pub development_mode: Option<bool>,
    /// Register the built-in error handler.
    pub default_error_handler: bool,
    /// Apply transform directives to JSON results.
    pub use_class_transformer: bool,
    /// Directory of templates loaded at bootstrap.
    pub template_dir: Option<PathBuf>,
    /// Error name to replacement payload.
    pub error_overriding_map: Map<String, Value>,
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            route_prefix: None,
            development_mode: None,
            default_error_handler: true,
            use_class_transformer: true,
            template_dir: None,
            error_overriding_map: Map::new(),
        }
    }
}

impl RoutingSection {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(prefix) = &self.route_prefix {
            if !prefix.is_empty() && !prefix.starts_with('/') {
                return Err(ConfigError::invalid_value(
                    "routing.route_prefix",
                    "must start with '/'",
                ));
            }
        }
        Ok(())
    }
}
