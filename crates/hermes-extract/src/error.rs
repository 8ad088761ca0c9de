//! Extraction error types.

use std::fmt;

use http::StatusCode;
use thiserror::Error;

use hermes_core::HttpError;

/// Part of the request a value was being read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Path parameters
    Path,
    /// Query string
    Query,
    /// Headers
    Header,
    /// `Cookie` header
    Cookie,
    /// Request body
    Body,
    /// `multipart/form-data` body
    Multipart,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
            Self::Multipart => "multipart",
        })
    }
}

/// Error raised while reading a value out of a request.
///
/// Converts into an [`HttpError`] with a client-error status.
///
/// # Example
///
/// ```rust
/// use hermes_extract::{ExtractionError, ExtractionSource};
/// use http::StatusCode;
///
/// let err = ExtractionError::invalid_json(ExtractionSource::Body, "{oops");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
///
/// let http: hermes_core::HttpError = err.into();
/// assert_eq!(http.name(), "ParseJsonError");
/// ```
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The value is not valid JSON.
    #[error("invalid JSON in {origin}: {value}")]
    InvalidJson {
        /// Where the value came from.
        origin: ExtractionSource,
        /// Offending text.
        value: String,
    },

    /// The value could not be decoded.
    #[error("cannot decode {origin} value `{field}`: {reason}")]
    InvalidEncoding {
        /// Where the value came from.
        origin: ExtractionSource,
        /// Field being decoded.
        field: String,
        /// Decoder message.
        reason: String,
    },

    /// The request body is not of the expected media type.
    #[error("unsupported media type: expected {expected}, got {}", .actual.as_deref().unwrap_or("none"))]
    UnsupportedMediaType {
        /// Expected media type.
        expected: &'static str,
        /// Received media type.
        actual: Option<String>,
    },

    /// The body or one of its parts exceeds a size limit.
    #[error("payload too large: {actual} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge {
        /// Configured limit.
        limit: usize,
        /// Received size.
        actual: usize,
    },

    /// The multipart body is malformed or exceeds the field count.
    #[error("malformed multipart body: {0}")]
    Multipart(String),
}

impl ExtractionError {
    /// The value is not valid JSON.
    pub fn invalid_json(origin: ExtractionSource, value: impl Into<String>) -> Self {
        Self::InvalidJson {
            origin,
            value: value.into(),
        }
    }

    /// The value could not be decoded.
    pub fn invalid_encoding(
        origin: ExtractionSource,
        field: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        Self::InvalidEncoding {
            origin,
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    /// Status used when this error reaches the client.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidJson { .. } | Self::InvalidEncoding { .. } | Self::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn error_name(&self) -> &'static str {
        match self {
            Self::InvalidJson { .. } => "ParseJsonError",
            Self::InvalidEncoding { .. } | Self::Multipart(_) => "BadRequestError",
            Self::UnsupportedMediaType { .. } => "UnsupportedMediaTypeError",
            Self::PayloadTooLarge { .. } => "PayloadTooLargeError",
        }
    }
}

impl From<ExtractionError> for HttpError {
    fn from(err: ExtractionError) -> Self {
        match &err {
            ExtractionError::InvalidJson { value, .. } => HttpError::parse_json(value),
            _ => HttpError::new(err.error_name(), err.to_string()).with_status(err.status_code()),
        }
    }
}
