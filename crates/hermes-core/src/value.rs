//! Resolved values flowing through an action.
//!
//! [`ParamValue`] is what parameter resolution produces for one declared
//! parameter; [`Args`] is the ordered list handed to the handler. The handler
//! returns something convertible into an [`ActionResult`], which interceptors
//! may replace before the response is shaped.

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::action::{ActionRequest, ActionResponse};
use crate::error::HttpError;

/// A file received in a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field name.
    pub field_name: String,
    /// Client-side file name.
    pub file_name: Option<String>,
    /// Declared content type.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

impl UploadedFile {
    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[derive(Debug, Default)]
struct ResponsePatch {
    status: Option<StatusCode>,
    headers: Vec<(String, String)>,
}

/// Handle through which a handler adjusts the response it does not own.
///
/// Status and headers set here are applied before the response is shaped.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandle {
    patch: Arc<Mutex<ResponsePatch>>,
}

impl ResponseHandle {
    /// Creates an empty handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the status of a successful response.
    pub fn set_status(&self, status: StatusCode) {
        self.patch.lock().status = Some(status);
    }

    /// Adds a response header.
    pub fn set_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.patch.lock().headers.push((name.into(), value.into()));
    }

    /// Status set by the handler, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.patch.lock().status
    }

    /// Writes the collected headers into `response`.
    pub fn apply_headers(&self, response: &mut ActionResponse) -> Result<(), HttpError> {
        let patch = self.patch.lock();
        for (name, value) in &patch.headers {
            response.set_header(name, value)?;
        }
        Ok(())
    }
}

/// A resolved parameter value.
#[derive(Debug, Clone)]
pub enum ParamValue {
    /// The source had no value.
    Absent,
    /// Text taken from the path, query, a header or a cookie.
    Text(String),
    /// Structured value: a parsed body, a coerced scalar, a map of values.
    Json(Value),
    /// One uploaded file.
    File(UploadedFile),
    /// Several uploaded files.
    Files(Vec<UploadedFile>),
    /// Snapshot of the raw request.
    Request(Arc<ActionRequest>),
    /// Handle on the response.
    Response(ResponseHandle),
}

impl ParamValue {
    /// True for [`ParamValue::Absent`] and JSON `null`.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Absent | Self::Json(Value::Null))
    }

    /// Text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(Value::String(text)) => Some(text),
            _ => None,
        }
    }
}

/// Resolved handler arguments in declared parameter order.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<ParamValue>,
}

impl Args {
    /// Wraps resolved values.
    #[must_use]
    pub fn new(values: Vec<ParamValue>) -> Self {
        Self { values }
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value at `index`; out-of-range indexes are [`ParamValue::Absent`].
    #[must_use]
    pub fn value(&self, index: usize) -> &ParamValue {
        self.values.get(index).unwrap_or(&ParamValue::Absent)
    }

    /// Deserializes the value at `index` into `T`.
    ///
    /// Absent values deserialize as `null`, so `Option<T>` accepts them.
    /// Text that does not fit `T` as a string is retried as JSON, which lets
    /// `"42"` become a number.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, HttpError> {
        let value = self.value(index);
        let json = match value {
            ParamValue::Absent => Value::Null,
            ParamValue::Text(text) => Value::String(text.clone()),
            ParamValue::Json(json) => json.clone(),
            _ => {
                return Err(HttpError::internal(format!(
                    "argument {index} is not a plain value"
                )))
            }
        };
        serde_json::from_value::<T>(json).or_else(|err| {
            value
                .as_text()
                .and_then(|text| serde_json::from_str::<T>(text).ok())
                .ok_or_else(|| {
                    HttpError::new(
                        "ParamNormalizationError",
                        format!("argument {index} cannot be converted: {err}"),
                    )
                    .with_status(StatusCode::BAD_REQUEST)
                })
        })
    }

    /// Text value at `index`.
    #[must_use]
    pub fn text(&self, index: usize) -> Option<&str> {
        self.value(index).as_text()
    }

    /// Uploaded file at `index`.
    #[must_use]
    pub fn file(&self, index: usize) -> Option<&UploadedFile> {
        match self.value(index) {
            ParamValue::File(file) => Some(file),
            _ => None,
        }
    }

    /// Uploaded files at `index`.
    #[must_use]
    pub fn files(&self, index: usize) -> &[UploadedFile] {
        match self.value(index) {
            ParamValue::Files(files) => files,
            _ => &[],
        }
    }

    /// Raw request at `index`.
    #[must_use]
    pub fn request(&self, index: usize) -> Option<&ActionRequest> {
        match self.value(index) {
            ParamValue::Request(request) => Some(request),
            _ => None,
        }
    }

    /// Response handle at `index`.
    #[must_use]
    pub fn response(&self, index: usize) -> Option<&ResponseHandle> {
        match self.value(index) {
            ParamValue::Response(handle) => Some(handle),
            _ => None,
        }
    }
}

/// What a handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// Nothing was returned.
    Undefined,
    /// An explicit null.
    Null,
    /// A structured value.
    Json(Value),
    /// Text.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
}

impl ActionResult {
    /// True for empty text and empty bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Json(Value::String(text)) => text.is_empty(),
            Self::Bytes(bytes) => bytes.is_empty(),
            _ => false,
        }
    }

    /// The result as a JSON value (bytes become a lossy string).
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Undefined | Self::Null => Value::Null,
            Self::Json(value) => value.clone(),
            Self::Text(text) => Value::String(text.clone()),
            Self::Bytes(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

/// Wrapper serializing any `T: Serialize` as a JSON result.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

/// Conversion of handler return values.
pub trait IntoActionResult {
    /// Converts `self`.
    fn into_action_result(self) -> Result<ActionResult, HttpError>;
}

impl IntoActionResult for ActionResult {
    fn into_action_result(self) -> Result<ActionResult, HttpError> {
        Ok(self)
    }
}

impl IntoActionResult for () {
    fn into_action_result(self) -> Result<ActionResult, HttpError> {
        Ok(ActionResult::Undefined)
    }
}

impl IntoActionResult for String {
    fn into_action_result(self) -> Result<ActionResult, HttpError> {
        Ok(ActionResult::Text(self))
    }
}

impl IntoActionResult for &'static str {
    fn into_action_result(self) -> Result<ActionResult, HttpError> {
        Ok(ActionResult::Text(self.to_string()))
    }
}

impl IntoActionResult for Bytes {
    fn into_action_result(self) -> Result<ActionResult, HttpError> {
        Ok(ActionResult::Bytes(self))
    }
}

impl IntoActionResult for Value {
    fn into_action_result(self) -> Result<ActionResult, HttpError> {
        Ok(match self {
            Value::Null => ActionResult::Null,
            value => ActionResult::Json(value),
        })
    }
}

impl<T: Serialize> IntoActionResult for Json<T> {
    fn into_action_result(self) -> Result<ActionResult, HttpError> {
        serde_json::to_value(self.0)?.into_action_result()
    }
}

impl<T: IntoActionResult> IntoActionResult for Option<T> {
    fn into_action_result(self) -> Result<ActionResult, HttpError> {
        match self {
            Some(value) => value.into_action_result(),
            None => Ok(ActionResult::Null),
        }
    }
}
