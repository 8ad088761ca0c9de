//! Startup errors.

use thiserror::Error;

use hermes_config::ConfigError;
use hermes_core::HermesError;
use hermes_server::ServerError;
use hermes_telemetry::TelemetryError;

/// Anything that stops an application from starting or serving.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// Declarations could not be compiled onto the driver.
    #[error(transparent)]
    Compile(#[from] HermesError),

    /// The listener failed.
    #[error(transparent)]
    Server(#[from] ServerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_are_transparent() {
        let err: StartupError = HermesError::Configuration("bad prefix".to_string()).into();
        assert_eq!(err.to_string(), "configuration error: bad prefix");

        let err: StartupError = ConfigError::file_not_found("hermes.toml").into();
        assert!(matches!(err, StartupError::Config(_)));
    }
}
