//! # Hermes Extract
//!
//! Reads parameter values out of a buffered request. Drivers call
//! [`extract`] for each declared parameter; the result is a
//! [`ParamValue`] that the executor validates and coerces.
//!
//! | Source | Value |
//! |--------|-------|
//! | path, query, header, cookie | [`ParamValue::Text`] (percent-decoded) |
//! | queries, headers, cookies | [`ParamValue::Json`] object |
//! | body | JSON, form object or text |
//! | body field | one field of a JSON, form or multipart body |
//! | session | session object or one of its values |
//! | uploaded file(s) | [`ParamValue::File`] / [`ParamValue::Files`] |
//! | request / response | request snapshot / fresh response handle |
//!
//! Missing values are [`ParamValue::Absent`]; required checks happen later.
//!
//! ## Example
//!
//! ```rust
//! use hermes_core::{ActionRequest, ParamSource, ParamType, ParamValue};
//! use hermes_extract::{extract, MultipartConfig};
//! use http::Method;
//!
//! # tokio_test_block(async {
//! let request = ActionRequest::new(Method::GET, "/questions?limit=10".parse().unwrap());
//! let source = ParamSource::named(ParamType::Query, "limit");
//!
//! let value = extract(&request, &source, MultipartConfig::default()).await.unwrap();
//! assert_eq!(value.as_text(), Some("10"));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod cookie;
mod error;
mod multipart;
mod query;

use std::sync::Arc;

use serde_json::{Map, Value};

use hermes_core::{ActionRequest, ParamSource, ParamType, ParamValue, ResponseHandle};

pub use body::{decode_body, BodyFormat};
pub use cookie::Cookies;
pub use error::{ExtractionError, ExtractionSource};
pub use multipart::{
    is_multipart, FormData, MultipartConfig, DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_FIELD_SIZE,
};
pub use query::QueryPairs;

/// Reads the value `source` describes from `request`.
pub async fn extract(
    request: &ActionRequest,
    source: &ParamSource,
    multipart: MultipartConfig,
) -> Result<ParamValue, ExtractionError> {
    let name = source.name.as_deref();
    let value = match source.kind {
        ParamType::Path => match name.and_then(|name| request.params().get(name)) {
            Some(raw) => ParamValue::Text(
                urlencoding::decode(raw)
                    .map_err(|e| ExtractionError::invalid_encoding(ExtractionSource::Path, raw, e))?
                    .into_owned(),
            ),
            None => ParamValue::Absent,
        },
        ParamType::Query => {
            let query = query_pairs(request)?;
            text_or_absent(name.and_then(|name| query.get(name)))
        }
        ParamType::Queries => ParamValue::Json(query_pairs(request)?.to_json()),
        ParamType::Header => text_or_absent(name.and_then(|name| request.header(name))),
        ParamType::Headers => ParamValue::Json(headers_json(request)),
        ParamType::Cookie => {
            let cookies = Cookies::from_headers(request.headers());
            text_or_absent(name.and_then(|name| cookies.get(name)))
        }
        ParamType::Cookies => ParamValue::Json(Cookies::from_headers(request.headers()).to_json()),
        ParamType::Body => body_value(request, source.json_body, multipart).await?,
        ParamType::BodyParam => body_field(request, name, source.json_body, multipart).await?,
        ParamType::Session => match (request.session(), name) {
            (None, _) => ParamValue::Absent,
            (Some(session), None) => ParamValue::Json(Value::Object(session.0.clone())),
            (Some(session), Some(name)) => session
                .get(name)
                .cloned()
                .map_or(ParamValue::Absent, ParamValue::Json),
        },
        ParamType::UploadedFile => {
            let form = form_data(request, multipart).await?;
            form.and_then(|form| name.and_then(|name| form.file(name).cloned()))
                .map_or(ParamValue::Absent, ParamValue::File)
        }
        ParamType::UploadedFiles => {
            let files = form_data(request, multipart)
                .await?
                .map(|form| match name {
                    Some(name) => form.files_named(name),
                    None => form.files().to_vec(),
                })
                .unwrap_or_default();
            if files.is_empty() {
                ParamValue::Absent
            } else {
                ParamValue::Files(files)
            }
        }
        ParamType::Request => ParamValue::Request(Arc::new(request.clone())),
        ParamType::Response => ParamValue::Response(ResponseHandle::new()),
    };
    Ok(value)
}

fn text_or_absent(value: Option<&str>) -> ParamValue {
    value.map_or(ParamValue::Absent, |text| ParamValue::Text(text.to_string()))
}

fn query_pairs(request: &ActionRequest) -> Result<QueryPairs, ExtractionError> {
    QueryPairs::parse(request.query().unwrap_or_default(), ExtractionSource::Query)
}

fn headers_json(request: &ActionRequest) -> Value {
    let mut map = Map::new();
    for name in request.headers().keys() {
        let joined = request
            .headers()
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_string(), Value::String(joined));
    }
    Value::Object(map)
}

async fn form_data(
    request: &ActionRequest,
    config: MultipartConfig,
) -> Result<Option<FormData>, ExtractionError> {
    if !is_multipart(request.headers()) {
        return Ok(None);
    }
    FormData::parse(request.headers(), request.body().clone(), config)
        .await
        .map(Some)
}

async fn body_value(
    request: &ActionRequest,
    force_json: bool,
    multipart: MultipartConfig,
) -> Result<ParamValue, ExtractionError> {
    if let Some(form) = form_data(request, multipart).await? {
        let fields = form
            .fields()
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect::<Map<_, _>>();
        return Ok(ParamValue::Json(Value::Object(fields)));
    }
    let format = BodyFormat::detect(request.headers(), force_json);
    Ok(match decode_body(request.body(), format)? {
        None => ParamValue::Absent,
        Some(Value::String(text)) if format == BodyFormat::Text => ParamValue::Text(text),
        Some(value) => ParamValue::Json(value),
    })
}

async fn body_field(
    request: &ActionRequest,
    name: Option<&str>,
    force_json: bool,
    multipart: MultipartConfig,
) -> Result<ParamValue, ExtractionError> {
    let Some(name) = name else {
        return Ok(ParamValue::Absent);
    };
    if let Some(form) = form_data(request, multipart).await? {
        return Ok(text_or_absent(form.field(name)));
    }
    // Body fields only exist in structured bodies; text bodies are read as JSON.
    let format = match BodyFormat::detect(request.headers(), force_json) {
        BodyFormat::Form => BodyFormat::Form,
        _ => BodyFormat::Json,
    };
    Ok(match decode_body(request.body(), format)? {
        Some(Value::Object(mut fields)) => fields
            .remove(name)
            .map_or(ParamValue::Absent, ParamValue::Json),
        _ => ParamValue::Absent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::Session;
    use hermes_router::Params;
    use http::Method;
    use serde_json::json;

    fn get(uri: &str) -> ActionRequest {
        ActionRequest::new(Method::GET, uri.parse().unwrap())
    }

    async fn run(request: &ActionRequest, source: ParamSource) -> ParamValue {
        extract(request, &source, MultipartConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_extract_path_decodes() {
        let mut request = get("/tags/rust%20lang");
        let mut params = Params::new();
        params.push("tag", "rust%20lang");
        request.set_params(params);

        let value = run(&request, ParamSource::named(ParamType::Path, "tag")).await;
        assert_eq!(value.as_text(), Some("rust lang"));
        let missing = run(&request, ParamSource::named(ParamType::Path, "id")).await;
        assert!(missing.is_missing());
    }

    #[tokio::test]
    async fn test_extract_queries() {
        let request = get("/q?a=1&a=2&b=3");
        match run(&request, ParamSource::new(ParamType::Queries)).await {
            ParamValue::Json(value) => assert_eq!(value, json!({"a": ["1", "2"], "b": "3"})),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_extract_headers_and_cookies() {
        let request = get("/")
            .with_header("X-Token", "abc")
            .with_header("Cookie", "sid=42");

        assert_eq!(
            run(&request, ParamSource::named(ParamType::Header, "x-token")).await.as_text(),
            Some("abc")
        );
        assert_eq!(
            run(&request, ParamSource::named(ParamType::Cookie, "sid")).await.as_text(),
            Some("42")
        );
        match run(&request, ParamSource::new(ParamType::Headers)).await {
            ParamValue::Json(value) => assert_eq!(value["x-token"], "abc"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_extract_body_by_content_type() {
        let json_request = ActionRequest::new(Method::POST, "/q".parse().unwrap())
            .with_header("content-type", "application/json")
            .with_body(r#"{"title":"t"}"#);
        assert!(matches!(
            run(&json_request, ParamSource::new(ParamType::Body)).await,
            ParamValue::Json(_)
        ));

        let text_request =
            ActionRequest::new(Method::POST, "/q".parse().unwrap()).with_body(r#"{"title":"t"}"#);
        assert!(matches!(
            run(&text_request, ParamSource::new(ParamType::Body)).await,
            ParamValue::Text(_)
        ));
        assert!(matches!(
            run(&text_request, ParamSource::new(ParamType::Body).json_body(true)).await,
            ParamValue::Json(_)
        ));
    }

    #[tokio::test]
    async fn test_extract_body_param() {
        let request = ActionRequest::new(Method::POST, "/q".parse().unwrap())
            .with_header("content-type", "application/json")
            .with_body(r#"{"title":"t","score":3}"#);
        match run(&request, ParamSource::named(ParamType::BodyParam, "score")).await {
            ParamValue::Json(value) => assert_eq!(value, json!(3)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(run(&request, ParamSource::named(ParamType::BodyParam, "nope"))
            .await
            .is_missing());
    }

    #[tokio::test]
    async fn test_extract_invalid_json_body() {
        let request = ActionRequest::new(Method::POST, "/q".parse().unwrap())
            .with_header("content-type", "application/json")
            .with_body("{broken");
        let err = extract(&request, &ParamSource::new(ParamType::Body), MultipartConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidJson { .. }));
    }

    #[tokio::test]
    async fn test_extract_session() {
        let mut request = get("/");
        assert!(run(&request, ParamSource::new(ParamType::Session)).await.is_missing());

        let mut session = Session::default();
        session.insert("user", "ada");
        request.extensions_mut().insert(session);
        match run(&request, ParamSource::named(ParamType::Session, "user")).await {
            ParamValue::Json(value) => assert_eq!(value, json!("ada")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_extract_files_absent_without_multipart() {
        let request = get("/");
        assert!(run(&request, ParamSource::named(ParamType::UploadedFile, "f")).await.is_missing());
        assert!(run(&request, ParamSource::new(ParamType::UploadedFiles)).await.is_missing());
    }

    #[tokio::test]
    async fn test_extract_request_and_response() {
        let request = get("/ping");
        match run(&request, ParamSource::new(ParamType::Request)).await {
            ParamValue::Request(snapshot) => assert_eq!(snapshot.path(), "/ping"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            run(&request, ParamSource::new(ParamType::Response)).await,
            ParamValue::Response(_)
        ));
    }
}
