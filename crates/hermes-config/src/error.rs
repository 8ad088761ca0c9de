//! Configuration error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Configuration file exists but could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    ReadError {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax error.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON syntax error, or a merged document that does not fit the schema.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension or format name is not TOML or JSON.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// A `.env` file exists but could not be parsed.
    #[error("failed to load .env file: {0}")]
    Dotenv(String),

    /// An environment variable could not be converted to the field's type.
    #[error("invalid value in environment variable {var}: {reason}")]
    EnvParse {
        /// Variable name.
        var: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A field holds a value the framework cannot use.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `server.addr`.
        field: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// Missing file at `path`.
    pub fn file_not_found(path: impl AsRef<Path>) -> Self {
        Self::FileNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// I/O failure while reading `path`.
    pub fn read_error(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Bad environment variable value.
    pub fn env_parse(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParse {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Bad field value found during validation.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_error() {
        let err = ConfigError::file_not_found("/etc/hermes/hermes.toml");
        assert!(err.to_string().contains("/etc/hermes/hermes.toml"));
    }

    #[test]
    fn test_env_parse_error() {
        let err = ConfigError::env_parse("HERMES__SERVER__BODY_LIMIT", "expected integer");
        let message = err.to_string();
        assert!(message.contains("HERMES__SERVER__BODY_LIMIT"));
        assert!(message.contains("expected integer"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("routing.route_prefix", "must start with '/'");
        assert_eq!(
            err.to_string(),
            "invalid value for routing.route_prefix: must start with '/'"
        );
    }

    #[test]
    fn test_toml_error_converts() {
        let parse: Result<toml::Value, _> = toml::from_str("[server");
        let err: ConfigError = parse.unwrap_err().into();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
