//! Layered configuration loading.
//!
//! Layers apply in order, later ones winning field by field:
//!
//! 1. a preset ([`HermesConfig::default`], `development` or `production`)
//! 2. configuration files and strings, in the order they were added
//! 3. variables from `.env` files
//! 4. process environment variables
//!
//! Environment variables use `PREFIX__SECTION__KEY`, e.g.
//! `HERMES__SERVER__ADDR=127.0.0.1:8080`.

use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::{Map, Value};

use hermes_telemetry::LogFormat;

use crate::config::{is_development_mode, MODE_ENV_VAR};
use crate::{ConfigError, HermesConfig};

/// Prefix used by [`ConfigLoader::with_env`].
pub const DEFAULT_ENV_PREFIX: &str = "HERMES";

/// Builds a [`HermesConfig`] from layered sources.
///
/// ```no_run
/// use hermes_config::ConfigLoader;
///
/// # fn main() -> Result<(), hermes_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("hermes.toml")?
///     .with_dotenv()?
///     .with_env()
///     .load()?;
/// println!("listening on {}", config.server.addr);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    base: HermesConfig,
    overlay: Value,
    env_prefix: Option<String>,
    dotenv_vars: Vec<(String, String)>,
    env_vars: Option<Vec<(String, String)>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Starts from [`HermesConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: HermesConfig::default(),
            overlay: Value::Object(Map::new()),
            env_prefix: None,
            dotenv_vars: Vec::new(),
            env_vars: None,
        }
    }

    /// Starts from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.base = HermesConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.base = HermesConfig::production();
        self
    }

    /// Layers a configuration file; the format follows the extension
    /// (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, or not valid TOML/JSON.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_string();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        tracing::debug!(path = %path.display(), "loading configuration file");
        self.with_string(&content, &format)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Layers configuration text in the named format (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Fails on a syntax error or an unsupported format name.
    ///
    /// ```
    /// use hermes_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[routing]\nroute_prefix = \"/api\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.routing.route_prefix.as_deref(), Some("/api"));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let document: Value = match format.to_ascii_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        merge_documents(&mut self.overlay, document);
        Ok(self)
    }

    /// Reads `PREFIX__SECTION__KEY` variables.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_ascii_uppercase());
        self
    }

    /// Reads `HERMES__SECTION__KEY` variables.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Reads variables from `vars` instead of the process environment.
    #[must_use]
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Reads the nearest `.env` file, if any.
    ///
    /// Its variables rank below the process environment and are not
    /// exported to the process.
    ///
    /// # Errors
    ///
    /// Fails if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv_iter() {
            Ok(iter) => self.collect_dotenv(iter),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::Dotenv(e.to_string())),
        }
    }

    /// Reads variables from a specific `.env` file.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or cannot be parsed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match dotenvy::from_path_iter(path) {
            Ok(iter) => self.collect_dotenv(iter),
            Err(e) if e.not_found() => Err(ConfigError::file_not_found(path)),
            Err(e) => Err(ConfigError::Dotenv(e.to_string())),
        }
    }

    fn collect_dotenv<I>(mut self, iter: I) -> Result<Self, ConfigError>
    where
        I: Iterator<Item = dotenvy::Result<(String, String)>>,
    {
        for item in iter {
            let pair = item.map_err(|e| ConfigError::Dotenv(e.to_string()))?;
            self.dotenv_vars.push(pair);
        }
        Ok(self)
    }

    /// Resolves all layers and validates the result.
    ///
    /// # Errors
    ///
    /// Fails if the merged document does not fit the schema, an
    /// environment variable cannot be parsed, or validation fails.
    pub fn load(self) -> Result<HermesConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves all layers without validating.
    ///
    /// # Errors
    ///
    /// Fails if the merged document does not fit the schema or an
    /// environment variable cannot be parsed.
    pub fn load_unvalidated(self) -> Result<HermesConfig, ConfigError> {
        let mut document = serde_json::to_value(&self.base)?;
        merge_documents(&mut document, self.overlay);
        let mut config: HermesConfig = serde_json::from_value(document)?;

        let mut vars = self.dotenv_vars;
        match self.env_vars {
            Some(explicit) => vars.extend(explicit),
            None => vars.extend(
                env::vars_os()
                    .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?))),
            ),
        }

        if let Some(prefix) = &self.env_prefix {
            let marker = format!("{prefix}__");
            for (key, value) in &vars {
                if let Some(path) = key.strip_prefix(&marker) {
                    apply_env_var(&mut config, key, path, value)?;
                }
            }
        }

        if config.routing.development_mode.is_none() {
            if let Some((_, mode)) = vars.iter().rev().find(|(key, _)| key == MODE_ENV_VAR) {
                config.routing.development_mode = Some(is_development_mode(Some(mode)));
            }
        }

        Ok(config)
    }
}

fn merge_documents(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(slot) => merge_documents(slot, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn apply_env_var(
    config: &mut HermesConfig,
    var: &str,
    path: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let parts: Vec<String> = path.split("__").map(str::to_ascii_lowercase).collect();
    let parts: Vec<&str> = parts.iter().map(String::as_str).collect();

    match parts.as_slice() {
        ["server", "addr"] => config.server.addr = value.to_string(),
        ["server", "shutdown_timeout_secs"] => {
            config.server.shutdown_timeout_secs = parse_value(var, value)?;
        }
        ["server", "request_timeout_ms"] => {
            config.server.request_timeout_ms = parse_value(var, value)?;
        }
        ["server", "body_limit"] => config.server.body_limit = parse_value(var, value)?,
        ["server", "keep_alive"] => config.server.keep_alive = parse_flag(var, value)?,

        ["routing", "route_prefix"] => config.routing.route_prefix = non_empty(value),
        ["routing", "development_mode"] => {
            config.routing.development_mode = Some(parse_flag(var, value)?);
        }
        ["routing", "default_error_handler"] => {
            config.routing.default_error_handler = parse_flag(var, value)?;
        }
        ["routing", "use_class_transformer"] => {
            config.routing.use_class_transformer = parse_flag(var, value)?;
        }
        ["routing", "template_dir"] => {
            config.routing.template_dir = non_empty(value).map(PathBuf::from);
        }
        ["routing", "error_overriding_map"] => {
            config.routing.error_overriding_map = serde_json::from_str(value)
                .map_err(|e| ConfigError::env_parse(var, format!("expected a JSON object: {e}")))?;
        }

        ["logging", "enabled"] => config.logging.enabled = parse_flag(var, value)?,
        ["logging", "level"] => config.logging.level = value.to_string(),
        ["logging", "format"] => {
            config.logging.format = match value.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => return Err(ConfigError::env_parse(var, "expected `json` or `pretty`")),
            };
        }
        ["logging", "span_events"] => config.logging.span_events = parse_flag(var, value)?,
        ["logging", "file_line_info"] => config.logging.file_line_info = parse_flag(var, value)?,
        ["logging", "include_target"] => config.logging.include_target = parse_flag(var, value)?,

        ["metrics", "enabled"] => config.metrics.enabled = parse_flag(var, value)?,
        ["metrics", "addr"] => config.metrics.addr = non_empty(value),
        ["metrics", "duration_buckets"] => {
            config.metrics.duration_buckets = value
                .split(',')
                .map(|bucket| parse_value(var, bucket.trim()))
                .collect::<Result<_, _>>()?;
        }

        _ => tracing::warn!(var, "ignoring unknown configuration variable"),
    }
    Ok(())
}

fn parse_value<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigError::env_parse(var, e.to_string()))
}

fn parse_flag(var: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse(var, "expected a boolean"))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Accepts `true/1/yes/on` and `false/0/no/off`, case-insensitively.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().with_env_vars(no_env()).load().unwrap();
        assert_eq!(config, HermesConfig::default());
    }

    #[test]
    fn test_loader_with_string_toml() {
        let toml = r#"
            [server]
            addr = "127.0.0.1:8080"

            [routing]
            route_prefix = "/api"
            use_class_transformer = false

            [routing.error_overriding_map.NotFoundError]
            message = "Nothing here"
        "#;
        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.addr, "127.0.0.1:8080");
        assert_eq!(config.routing.route_prefix.as_deref(), Some("/api"));
        assert!(!config.routing.use_class_transformer);
        assert_eq!(
            config.routing.error_overriding_map["NotFoundError"]["message"],
            "Nothing here"
        );
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"metrics": {"enabled": true, "addr": "127.0.0.1:9090"}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.addr.as_deref(), Some("127.0.0.1:9090"));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("addr: x", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(f)) if f == "yaml"));
    }

    #[test]
    fn test_layers_merge_field_by_field() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string("[server]\naddr = \"127.0.0.1:1\"", "toml")
            .unwrap()
            .with_string(r#"{"server": {"keep_alive": false}}"#, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.addr, "127.0.0.1:1");
        assert!(!config.server.keep_alive);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.routing.development_mode, Some(true));
    }

    #[test]
    fn test_unknown_field_in_file_rejected() {
        let result = ConfigLoader::new()
            .with_string("[server]\nport = 8080", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_loader_with_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"\nformat = \"pretty\"").unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/hermes.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/hermes.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigLoader::new()
            .with_env()
            .with_env_vars([
                ("HERMES__SERVER__ADDR", "127.0.0.1:4000"),
                ("HERMES__SERVER__BODY_LIMIT", "1024"),
                ("HERMES__ROUTING__ROUTE_PREFIX", "/v1"),
                ("HERMES__ROUTING__DEFAULT_ERROR_HANDLER", "off"),
                ("HERMES__LOGGING__FORMAT", "Pretty"),
                ("HERMES__METRICS__DURATION_BUCKETS", "0.1, 0.5, 1"),
                ("HERMES_ENV", "production"),
                ("OTHER__SERVER__ADDR", "ignored"),
            ])
            .load()
            .unwrap();

        assert_eq!(config.server.addr, "127.0.0.1:4000");
        assert_eq!(config.server.body_limit, 1024);
        assert_eq!(config.routing.route_prefix.as_deref(), Some("/v1"));
        assert!(!config.routing.default_error_handler);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.metrics.duration_buckets, vec![0.1, 0.5, 1.0]);
        assert_eq!(config.routing.development_mode, Some(false));
    }

    #[test]
    fn test_env_overrides_win_over_files() {
        let config = ConfigLoader::new()
            .with_string("[server]\naddr = \"127.0.0.1:1\"", "toml")
            .unwrap()
            .with_env()
            .with_env_vars([("HERMES__SERVER__ADDR", "127.0.0.1:2")])
            .load()
            .unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:2");
    }

    #[test]
    fn test_env_vars_ignored_without_prefix() {
        let config = ConfigLoader::new()
            .with_env_vars([("HERMES__SERVER__ADDR", "127.0.0.1:2")])
            .load()
            .unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_env_parse_errors() {
        let result = ConfigLoader::new()
            .with_env()
            .with_env_vars([("HERMES__SERVER__BODY_LIMIT", "lots")])
            .load();
        assert!(
            matches!(result, Err(ConfigError::EnvParse { var, .. }) if var == "HERMES__SERVER__BODY_LIMIT")
        );

        let result = ConfigLoader::new()
            .with_env()
            .with_env_vars([("HERMES__ROUTING__USE_CLASS_TRANSFORMER", "maybe")])
            .load();
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_env_var_is_ignored() {
        let config = ConfigLoader::new()
            .with_env()
            .with_env_vars([("HERMES__SERVER__PORT", "8080")])
            .load()
            .unwrap();
        assert_eq!(config, HermesConfig::default());
    }

    #[test]
    fn test_explicit_mode_beats_env_mode() {
        let config = ConfigLoader::new()
            .with_development()
            .with_env_vars([("HERMES_ENV", "production")])
            .load()
            .unwrap();
        assert_eq!(config.routing.development_mode, Some(true));
    }

    #[test]
    fn test_dotenv_file_ranks_below_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "HERMES__SERVER__ADDR=127.0.0.1:5000\nHERMES__LOGGING__LEVEL=warn\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_dotenv_file(&path)
            .unwrap()
            .with_env()
            .with_env_vars([("HERMES__LOGGING__LEVEL", "error")])
            .load()
            .unwrap();

        assert_eq!(config.server.addr, "127.0.0.1:5000");
        assert_eq!(config.logging.level, "error");
    }

    #[test]
    fn test_missing_dotenv_file() {
        let result = ConfigLoader::new().with_dotenv_file("/nonexistent/.env");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_validation_runs_on_load() {
        let result = ConfigLoader::new()
            .with_string(r#"{"routing": {"route_prefix": "api"}}"#, "json")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let config = ConfigLoader::new()
            .with_string(r#"{"routing": {"route_prefix": "api"}}"#, "json")
            .unwrap()
            .load_unvalidated()
            .unwrap();
        assert_eq!(config.routing.route_prefix.as_deref(), Some("api"));
    }

    #[test]
    fn test_merge_documents() {
        let mut base = serde_json::json!({ "a": { "b": 1, "c": 2 }, "d": [1] });
        merge_documents(&mut base, serde_json::json!({ "a": { "c": 3 }, "d": [2, 3] }));
        assert_eq!(base, serde_json::json!({ "a": { "b": 1, "c": 3 }, "d": [2, 3] }));
    }

    #[test]
    fn test_parse_bool() {
        for value in ["true", "TRUE", "1", "yes", "On"] {
            assert_eq!(parse_bool(value), Some(true), "{value}");
        }
        for value in ["false", "False", "0", "no", "OFF"] {
            assert_eq!(parse_bool(value), Some(false), "{value}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }
}
