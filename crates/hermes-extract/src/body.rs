//! Request body decoding.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use serde_json::Value;

use crate::error::{ExtractionError, ExtractionSource};
use crate::query::QueryPairs;

/// How a body should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// JSON document.
    Json,
    /// `application/x-www-form-urlencoded` fields.
    Form,
    /// UTF-8 text.
    Text,
}

impl BodyFormat {
    /// Chooses the format from the `Content-Type` header, or JSON when forced.
    #[must_use]
    pub fn detect(headers: &HeaderMap, force_json: bool) -> Self {
        if force_json {
            return Self::Json;
        }
        let Some(mime) = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<mime::Mime>().ok())
        else {
            return Self::Text;
        };
        if mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON) {
            Self::Json
        } else if mime.type_() == mime::APPLICATION && mime.subtype() == mime::WWW_FORM_URLENCODED {
            Self::Form
        } else {
            Self::Text
        }
    }
}

/// Decodes a body. An empty body is `None`.
///
/// JSON bodies that fail to parse are reported with their text. Form bodies
/// become an object of fields and anything else a JSON string.
pub fn decode_body(body: &Bytes, format: BodyFormat) -> Result<Option<Value>, ExtractionError> {
    if body.is_empty() {
        return Ok(None);
    }
    let value = match format {
        BodyFormat::Json => serde_json::from_slice(body).map_err(|_| {
            ExtractionError::invalid_json(ExtractionSource::Body, String::from_utf8_lossy(body))
        })?,
        BodyFormat::Form => {
            let text = std::str::from_utf8(body)
                .map_err(|e| ExtractionError::invalid_encoding(ExtractionSource::Body, "form", e))?;
            QueryPairs::parse(text, ExtractionSource::Body)?.to_json()
        }
        BodyFormat::Text => Value::String(String::from_utf8_lossy(body).into_owned()),
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(BodyFormat::detect(&headers("application/json"), false), BodyFormat::Json);
        assert_eq!(
            BodyFormat::detect(&headers("application/vnd.api+json; charset=utf-8"), false),
            BodyFormat::Json
        );
        assert_eq!(
            BodyFormat::detect(&headers("application/x-www-form-urlencoded"), false),
            BodyFormat::Form
        );
        assert_eq!(BodyFormat::detect(&headers("text/plain"), false), BodyFormat::Text);
        assert_eq!(BodyFormat::detect(&HeaderMap::new(), false), BodyFormat::Text);
        assert_eq!(BodyFormat::detect(&headers("text/plain"), true), BodyFormat::Json);
    }

    #[test]
    fn test_decode_json() {
        let body = Bytes::from_static(br#"{"title":"Why?"}"#);
        let value = decode_body(&body, BodyFormat::Json).unwrap();
        assert_eq!(value, Some(json!({"title": "Why?"})));
    }

    #[test]
    fn test_decode_invalid_json() {
        let body = Bytes::from_static(b"{title");
        let err = decode_body(&body, BodyFormat::Json).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidJson { ref value, .. } if value == "{title"));
    }

    #[test]
    fn test_decode_form_and_text() {
        let form = decode_body(&Bytes::from_static(b"a=1&b=x+y"), BodyFormat::Form).unwrap();
        assert_eq!(form, Some(json!({"a": "1", "b": "x y"})));

        let text = decode_body(&Bytes::from_static(b"hello"), BodyFormat::Text).unwrap();
        assert_eq!(text, Some(json!("hello")));
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_body(&Bytes::new(), BodyFormat::Json).unwrap(), None);
    }
}
