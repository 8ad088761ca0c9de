//! Error types for Hermes.
//!
//! Two families of errors exist:
//!
//! - [`HttpError`]: anything that goes wrong while handling a request. It is
//!   identified by a `name` (used by the error-overriding map and by custom
//!   error handlers), carries a message and, optionally, its own HTTP status.
//! - [`HermesError`]: startup failures (bad routes, unresolvable instances,
//!   unavailable drivers). These abort startup.
//!
//! An `HttpError` without its own status lets the action decide: the
//! action's error-code directive applies, then `500`.

use std::borrow::Cow;

use http::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

use hermes_router::RouteError;

use crate::di::InjectionError;

/// Result type alias for startup operations.
pub type HermesResult<T> = Result<T, HermesError>;

/// Error raised while handling a request.
///
/// # Example
///
/// ```
/// use hermes_core::HttpError;
/// use http::StatusCode;
///
/// let err = HttpError::new("QuestionMissing", "question 7 does not exist");
/// assert_eq!(err.status(), None);
///
/// let err = HttpError::not_found("question 7 does not exist");
/// assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
/// assert_eq!(err.name(), "NotFoundError");
/// ```
#[derive(Debug, Error)]
#[error("{name}: {message}")]
pub struct HttpError {
    name: Cow<'static, str>,
    message: String,
    status: Option<StatusCode>,
    details: Option<Map<String, Value>>,
    #[source]
    source: Option<anyhow::Error>,
}

impl HttpError {
    /// Creates an error with a name and message and no status of its own.
    pub fn new(name: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            status: None,
            details: None,
            source: None,
        }
    }

    /// Creates an error whose name is derived from `status`.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let name: Cow<'static, str> = match status {
            StatusCode::BAD_REQUEST => "BadRequestError".into(),
            StatusCode::UNAUTHORIZED => "UnauthorizedError".into(),
            StatusCode::FORBIDDEN => "ForbiddenError".into(),
            StatusCode::NOT_FOUND => "NotFoundError".into(),
            StatusCode::METHOD_NOT_ALLOWED => "MethodNotAllowedError".into(),
            StatusCode::NOT_ACCEPTABLE => "NotAcceptableError".into(),
            StatusCode::INTERNAL_SERVER_ERROR => "InternalServerError".into(),
            _ => "HttpError".into(),
        };
        Self::new(name, message).with_status(status)
    }

    /// `400 BadRequestError`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::BAD_REQUEST, message)
    }

    /// `401 UnauthorizedError`.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::UNAUTHORIZED, message)
    }

    /// `403 ForbiddenError`.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::FORBIDDEN, message)
    }

    /// `404 NotFoundError`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::NOT_FOUND, message)
    }

    /// `405 MethodNotAllowedError`.
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::METHOD_NOT_ALLOWED, message)
    }

    /// `500 InternalServerError`.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// `400 ParamRequiredError` for a missing required parameter.
    pub fn param_required(
        kind: &str,
        name: Option<&str>,
        method: &http::Method,
        path: &str,
    ) -> Self {
        let message = match name {
            Some(name) => format!("{kind} parameter \"{name}\" is required for request on {method} {path}"),
            None => format!("{kind} is required for request on {method} {path}"),
        };
        Self::new("ParamRequiredError", message).with_status(StatusCode::BAD_REQUEST)
    }

    /// `400 ParamNormalizationError` for a value that failed coercion.
    pub fn param_normalization(name: &str, expected: &str, value: &str) -> Self {
        Self::new(
            "ParamNormalizationError",
            format!("given parameter {name} is invalid: value ({value}) cannot be parsed into {expected}"),
        )
        .with_status(StatusCode::BAD_REQUEST)
    }

    /// `400 ParseJsonError` for a body or value that is not valid JSON.
    pub fn parse_json(value: &str) -> Self {
        Self::new(
            "ParseJsonError",
            format!("given parameter value ({value}) is not a valid JSON"),
        )
        .with_status(StatusCode::BAD_REQUEST)
    }

    /// Sets the error's own status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Adds a detail field rendered into default error bodies.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Attaches an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Error identifier (e.g. `NotFoundError`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error's own status, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Extra detail fields.
    #[must_use]
    pub fn details(&self) -> Option<&Map<String, Value>> {
        self.details.as_ref()
    }

    /// Renders the cause chain, one cause per line.
    #[must_use]
    pub fn stack(&self) -> String {
        let mut lines = vec![format!("{}: {}", self.name, self.message)];
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            lines.push(format!("    caused by: {err}"));
            cause = err.source();
        }
        lines.join("\n")
    }

    /// Builds the default JSON payload for this error.
    ///
    /// The payload has `name`, `message` and `status`, followed by the
    /// detail fields. `stack` is only included when `development` is set.
    #[must_use]
    pub fn to_payload(&self, status: StatusCode, development: bool) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("name".into(), Value::String(self.name.to_string()));
        payload.insert("message".into(), Value::String(self.message.clone()));
        payload.insert("status".into(), Value::from(status.as_u16()));
        if let Some(details) = &self.details {
            for (key, value) in details {
                payload.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        if development {
            payload.insert("stack".into(), Value::String(self.stack()));
        }
        payload
    }
}

impl From<anyhow::Error> for HttpError {
    fn from(err: anyhow::Error) -> Self {
        Self::new("Error", err.to_string()).with_source(err)
    }
}

impl From<InjectionError> for HttpError {
    fn from(err: InjectionError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        Self::new("SerializationError", err.to_string()).with_source(err)
    }
}

/// Startup and configuration errors.
#[derive(Debug, Error)]
pub enum HermesError {
    /// A route could not be built or registered.
    #[error("invalid route: {0}")]
    Route(#[from] RouteError),

    /// A controller, middleware, interceptor or error handler could not be
    /// instantiated.
    #[error(transparent)]
    Injection(#[from] InjectionError),

    /// The driver cannot serve requests.
    #[error("driver `{driver}` is unavailable: {reason}")]
    DriverUnavailable {
        /// Driver name.
        driver: &'static str,
        /// Why the driver cannot start.
        reason: String,
    },

    /// A template failed to load.
    #[error("template `{name}` failed to load: {message}")]
    Template {
        /// Template name.
        name: String,
        /// Loader message.
        message: String,
    },

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Configuration(String),
}
