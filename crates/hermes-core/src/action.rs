//! Request-scoped state.
//!
//! An [`Action`] pairs the raw request with the response being built for it.
//! Drivers create one per inbound request; middlewares, the action handler
//! and error handlers all work on the same value. The response can be sent
//! exactly once: later writes are ignored and logged.

use std::fmt;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use http::{Extensions, HeaderMap, Method, StatusCode, Uri};
use serde_json::{Map, Value};

use hermes_router::Params;

use crate::context::RequestId;
use crate::error::HttpError;

/// HTTP method an action is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
    /// Any method.
    All,
}

impl ActionType {
    /// The concrete method, or `None` for [`ActionType::All`].
    #[must_use]
    pub fn method(self) -> Option<Method> {
        match self {
            Self::Get => Some(Method::GET),
            Self::Post => Some(Method::POST),
            Self::Put => Some(Method::PUT),
            Self::Patch => Some(Method::PATCH),
            Self::Delete => Some(Method::DELETE),
            Self::Head => Some(Method::HEAD),
            Self::Options => Some(Method::OPTIONS),
            Self::All => None,
        }
    }

    /// Lowercase name, as used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Options => "options",
            Self::All => "all",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session data attached to a request by a session middleware.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session(pub Map<String, Value>);

impl Session {
    /// Returns a session value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Stores a session value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }
}

/// The raw inbound request.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: Params,
    extensions: Extensions,
    request_id: RequestId,
}

impl ActionRequest {
    /// Creates a request with no headers and an empty body.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: Params::new(),
            extensions: Extensions::new(),
            request_id: RequestId::new(),
        }
    }

    /// Converts a buffered `http` request.
    ///
    /// An `x-request-id` header holding a UUID is reused as the request id.
    #[must_use]
    pub fn from_http(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .and_then(RequestId::parse)
            .unwrap_or_default();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: Params::new(),
            extensions: parts.extensions,
            request_id,
        }
    }

    /// Adds a header; invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            self.headers.append(name, value);
        }
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `Content-Type` without parameters, lowercased.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        self.header(CONTENT_TYPE.as_str())
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
    }

    /// Buffered body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Path params captured by the matched route.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Stores the params of the matched route.
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Typed extensions (session data and anything middlewares attach).
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable typed extensions.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Session attached by a middleware, if any.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.extensions.get::<Session>()
    }

    /// Request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }
}

/// Body written to a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// No body.
    Empty,
    /// JSON document.
    Json(Value),
    /// Plain text.
    Text(String),
    /// Rendered HTML.
    Html(String),
    /// Raw bytes.
    Bytes(Bytes),
}

impl ResponseBody {
    /// Content type implied by the body kind.
    #[must_use]
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Empty => None,
            Self::Json(_) => Some("application/json; charset=utf-8"),
            Self::Text(_) => Some("text/plain; charset=utf-8"),
            Self::Html(_) => Some("text/html; charset=utf-8"),
            Self::Bytes(_) => Some("application/octet-stream"),
        }
    }

    /// Serializes the body.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Empty => Bytes::new(),
            Self::Json(value) => Bytes::from(value.to_string()),
            Self::Text(text) | Self::Html(text) => Bytes::from(text),
            Self::Bytes(bytes) => bytes,
        }
    }
}

/// The response being built for a request.
#[derive(Debug, Clone)]
pub struct ActionResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    sent: bool,
}

impl Default for ActionResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            sent: false,
        }
    }
}

impl ActionResponse {
    /// Current status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status without sending.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets a header from text, replacing earlier values.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), HttpError> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HttpError::internal(format!("invalid header name `{name}`")).with_source(e))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| HttpError::internal(format!("invalid value for header `{name}`")).with_source(e))?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    /// Body written so far.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns true once a response was sent.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Sends `body` with `status`. Returns false if a response was already sent.
    ///
    /// The body's implied content type is set unless one is already present.
    pub fn send(&mut self, status: StatusCode, body: ResponseBody) -> bool {
        if self.sent {
            tracing::warn!(status = %status, "response already sent, ignoring second write");
            return false;
        }
        if let Some(content_type) = body.content_type() {
            if !self.headers.contains_key(CONTENT_TYPE) {
                self.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }
        self.status = status;
        self.body = body.into_bytes();
        self.sent = true;
        true
    }

    /// Sends an empty response.
    pub fn end(&mut self, status: StatusCode) -> bool {
        self.send(status, ResponseBody::Empty)
    }

    /// Sends a `302 Found` redirect.
    pub fn redirect(&mut self, location: &str) -> bool {
        if self.sent {
            tracing::warn!(location, "response already sent, ignoring redirect");
            return false;
        }
        match HeaderValue::from_str(location) {
            Ok(value) => {
                self.headers.insert(LOCATION, value);
                self.end(StatusCode::FOUND)
            }
            Err(_) => {
                tracing::warn!(location, "invalid redirect location");
                self.end(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Converts into an `http` response.
    #[must_use]
    pub fn into_http(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// An error recorded for a request, with the response prepared for it.
#[derive(Debug)]
pub struct ActionFailure {
    error: HttpError,
    status: StatusCode,
    body: ResponseBody,
}

impl ActionFailure {
    /// Creates a failure.
    #[must_use]
    pub fn new(error: HttpError, status: StatusCode, body: ResponseBody) -> Self {
        Self {
            error,
            status,
            body,
        }
    }

    /// The error.
    #[must_use]
    pub fn error(&self) -> &HttpError {
        &self.error
    }

    /// Status the default error response uses.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Body the default error response uses.
    #[must_use]
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }
}

/// Request-scoped state shared by the whole pipeline.
#[derive(Debug)]
pub struct Action {
    /// The inbound request.
    pub request: ActionRequest,
    /// The response being built.
    pub response: ActionResponse,
    failure: Option<ActionFailure>,
}

impl Action {
    /// Wraps a request with a fresh response.
    #[must_use]
    pub fn new(request: ActionRequest) -> Self {
        Self {
            request,
            response: ActionResponse::default(),
            failure: None,
        }
    }

    /// Records a failure; the first one recorded is kept.
    pub fn fail(&mut self, failure: ActionFailure) {
        if self.failure.is_some() {
            tracing::warn!(error = %failure.error, "request already failed, dropping error");
            return;
        }
        self.failure = Some(failure);
    }

    /// Returns true if a failure is pending.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Pending failure.
    #[must_use]
    pub fn failure(&self) -> Option<&ActionFailure> {
        self.failure.as_ref()
    }

    /// Takes the pending failure.
    pub fn take_failure(&mut self) -> Option<ActionFailure> {
        self.failure.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> ActionRequest {
        ActionRequest::new(Method::GET, uri.parse().unwrap())
    }

    #[test]
    fn test_action_type_method() {
        assert_eq!(ActionType::Get.method(), Some(Method::GET));
        assert_eq!(ActionType::All.method(), None);
        assert_eq!(ActionType::Delete.to_string(), "delete");
    }

    #[test]
    fn test_request_accessors() {
        let req = request("/questions?limit=5")
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_body("{}");

        assert_eq!(req.path(), "/questions");
        assert_eq!(req.query(), Some("limit=5"));
        assert_eq!(req.content_type().as_deref(), Some("application/json"));
        assert_eq!(req.body().as_ref(), b"{}");
    }

    #[test]
    fn test_request_id_from_header() {
        let id = RequestId::new();
        let http_request = http::Request::builder()
            .uri("/")
            .header("x-request-id", id.to_string())
            .body(Bytes::new())
            .unwrap();
        assert_eq!(ActionRequest::from_http(http_request).request_id(), id);
    }

    #[test]
    fn test_session_in_extensions() {
        let mut req = request("/");
        let mut session = Session::default();
        session.insert("user", "ada");
        req.extensions_mut().insert(session);

        assert_eq!(req.session().unwrap().get("user").unwrap(), "ada");
    }

    #[test]
    fn test_response_send_once() {
        let mut response = ActionResponse::default();
        assert!(response.send(StatusCode::OK, ResponseBody::Json(serde_json::json!({"id": 1}))));
        assert!(!response.send(StatusCode::INTERNAL_SERVER_ERROR, ResponseBody::Text("boom".into())));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), br#"{"id":1}"#);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
    }

    #[test]
    fn test_response_keeps_explicit_content_type() {
        let mut response = ActionResponse::default();
        response.set_header("Content-Type", "application/vnd.api+json").unwrap();
        response.send(StatusCode::OK, ResponseBody::Json(Value::Null));
        assert_eq!(response.headers()[CONTENT_TYPE], "application/vnd.api+json");
    }

    #[test]
    fn test_response_redirect() {
        let mut response = ActionResponse::default();
        response.redirect("/questions/1");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/questions/1");
        assert!(response.is_sent());
    }

    #[test]
    fn test_invalid_header_is_error() {
        let mut response = ActionResponse::default();
        assert!(response.set_header("bad header", "x").is_err());
    }

    #[test]
    fn test_action_keeps_first_failure() {
        let mut action = Action::new(request("/"));
        action.fail(ActionFailure::new(
            HttpError::bad_request("first"),
            StatusCode::BAD_REQUEST,
            ResponseBody::Empty,
        ));
        action.fail(ActionFailure::new(
            HttpError::internal("second"),
            StatusCode::INTERNAL_SERVER_ERROR,
            ResponseBody::Empty,
        ));

        assert_eq!(action.failure().unwrap().error().message(), "first");
        assert!(action.take_failure().is_some());
        assert!(!action.has_failed());
    }
}
