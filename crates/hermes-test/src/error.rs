//! Test error types.

use thiserror::Error;

/// Errors raised while building a request or reading a response.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request could not be built.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// A header name or value is invalid.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The body is not valid UTF-8.
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Form encoding failed.
    #[error("form encoding error: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let error = TestError::InvalidHeader("bad name".to_string());
        assert_eq!(error.to_string(), "invalid header: bad name");
    }

    #[test]
    fn test_from_json_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = TestError::from(source);
        assert!(matches!(error, TestError::Json(_)));
        assert!(error.to_string().starts_with("JSON error"));
    }
}
