//! Test response wrapper.

use std::fmt;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TestError;

/// A buffered response with assertion helpers.
///
/// The `assert_*` methods panic with a readable message and return `&Self`
/// so several checks can be chained.
#[derive(Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Wraps a buffered HTTP response.
    pub fn from_http(response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Creates a response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Status code as a number.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// True for 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// True for 3xx.
    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }

    /// True for 4xx.
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// True for 5xx.
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// A header value as text.
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// The `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// The `Location` header.
    pub fn location(&self) -> Option<&str> {
        self.header_str(header::LOCATION.as_str())
    }

    /// Raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<String, TestError> {
        Ok(String::from_utf8(self.body.to_vec())?)
    }

    /// Body deserialized from JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body as a JSON value.
    pub fn json_value(&self) -> Result<Value, TestError> {
        self.json()
    }

    /// Asserts the status.
    ///
    /// # Panics
    ///
    /// Panics when the status differs.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} with body {}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts the status as a number.
    pub fn assert_status_code(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "expected status {expected}, got {}",
            self.status
        );
        self
    }

    /// Asserts a header value.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("header '{name}' not found"));
        assert_eq!(actual, expected.as_ref(), "header '{name}' mismatch");
        self
    }

    /// Asserts a header is absent.
    pub fn assert_no_header(&self, name: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        assert!(
            self.header(name).is_none(),
            "header '{name}' should be absent, got {:?}",
            self.header(name)
        );
        self
    }

    /// Asserts the `Content-Type` starts with `expected`.
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let actual = self
            .content_type()
            .unwrap_or_else(|| panic!("Content-Type not found, expected '{expected}'"));
        assert!(
            actual.starts_with(expected),
            "Content-Type: expected '{expected}', got '{actual}'"
        );
        self
    }

    /// Asserts the body equals `expected`.
    pub fn assert_body_eq(&self, expected: impl AsRef<str>) -> &Self {
        assert_eq!(
            String::from_utf8_lossy(&self.body),
            expected.as_ref(),
            "body mismatch"
        );
        self
    }

    /// Asserts the body contains `expected`.
    pub fn assert_body_contains(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let body = String::from_utf8_lossy(&self.body);
        assert!(
            body.contains(expected),
            "body should contain '{expected}', got: {body}"
        );
        self
    }

    /// Asserts the body is empty.
    pub fn assert_empty_body(&self) -> &Self {
        assert!(
            self.body.is_empty(),
            "body should be empty, got: {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts the body is JSON equal to `expected`.
    pub fn assert_json(&self, expected: &Value) -> &Self {
        let actual = self
            .json_value()
            .unwrap_or_else(|e| panic!("body is not JSON ({e}): {}", String::from_utf8_lossy(&self.body)));
        assert_eq!(&actual, expected, "JSON body mismatch");
        self
    }

    /// Asserts every field of `expected` appears with the same value in the
    /// JSON object body.
    pub fn assert_json_contains(&self, expected: &Value) -> &Self {
        let actual = self
            .json_value()
            .unwrap_or_else(|e| panic!("body is not JSON ({e}): {}", String::from_utf8_lossy(&self.body)));
        let Some(fields) = expected.as_object() else {
            panic!("assert_json_contains expects an object, got {expected}");
        };
        for (key, value) in fields {
            assert_eq!(
                actual.get(key),
                Some(value),
                "field '{key}' mismatch in {actual}"
            );
        }
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &String::from_utf8_lossy(&self.body))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: StatusCode, content_type: &str, body: &'static str) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(content_type).unwrap(),
        );
        TestResponse::new(status, headers, Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn test_status_helpers() {
        let ok = response(StatusCode::OK, "text/plain", "ok");
        assert!(ok.is_success());
        assert!(!ok.is_client_error());
        assert_eq!(ok.status_code(), 200);

        let missing = response(StatusCode::NOT_FOUND, "text/plain", "");
        assert!(missing.is_client_error());
        assert!(!missing.is_server_error());
    }

    #[test]
    fn test_json_assertions() {
        let res = response(
            StatusCode::OK,
            "application/json; charset=utf-8",
            r#"{"id":1,"title":"First"}"#,
        );
        res.assert_status(StatusCode::OK)
            .assert_content_type("application/json")
            .assert_json(&json!({ "id": 1, "title": "First" }))
            .assert_json_contains(&json!({ "id": 1 }));
    }

    #[test]
    fn test_text_and_headers() {
        let res = response(StatusCode::OK, "text/plain; charset=utf-8", "hello");
        assert_eq!(res.text().unwrap(), "hello");
        res.assert_header("content-type", "text/plain; charset=utf-8")
            .assert_no_header("location")
            .assert_body_contains("ell")
            .assert_body_eq("hello");
    }

    #[test]
    #[should_panic(expected = "expected status 201")]
    fn test_assert_status_panics() {
        response(StatusCode::OK, "text/plain", "").assert_status(StatusCode::CREATED);
    }

    #[test]
    fn test_invalid_utf8() {
        let res = TestResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            Bytes::from_static(&[0xff, 0xfe]),
        );
        assert!(matches!(res.text(), Err(TestError::Utf8(_))));
    }
}
