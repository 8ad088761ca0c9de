//! Parameter resolution.
//!
//! Each declared parameter is fetched through the driver, checked against
//! its `required` flag and coerced to its declared format. The first
//! failure aborts resolution.

use serde_json::{Number, Value};

use hermes_core::{ActionRequest, Args, HttpError, ParamFormat, ParamType, ParamValue};
use hermes_metadata::{ActionMetadata, ParamMetadata};
use hermes_middleware::Driver;

/// Resolves handler arguments for one action.
#[derive(Debug, Clone, Copy)]
pub struct ParamResolver<'m> {
    action: &'m ActionMetadata,
}

impl<'m> ParamResolver<'m> {
    /// Creates a resolver for `action`.
    #[must_use]
    pub fn new(action: &'m ActionMetadata) -> Self {
        Self { action }
    }

    /// Resolves every parameter in index order.
    ///
    /// Each value lands at its declared argument index; undeclared
    /// positions hold [`ParamValue::Absent`].
    pub async fn resolve(
        &self,
        driver: &dyn Driver,
        request: &ActionRequest,
    ) -> Result<Args, HttpError> {
        let arity = self
            .action
            .params
            .iter()
            .map(|param| param.index + 1)
            .max()
            .unwrap_or(0);
        let mut values: Vec<ParamValue> = std::iter::repeat_with(|| ParamValue::Absent)
            .take(arity)
            .collect();
        for param in &self.action.params {
            values[param.index] = self.resolve_param(driver, request, param).await?;
        }
        Ok(Args::new(values))
    }

    /// Resolves one parameter.
    pub async fn resolve_param(
        &self,
        driver: &dyn Driver,
        request: &ActionRequest,
        param: &ParamMetadata,
    ) -> Result<ParamValue, HttpError> {
        let source = param.source(self.action.is_json_typed());
        let value = driver.get_param_from_request(request, &source).await?;

        if param.required && is_missing(param.kind, &value) {
            return Err(HttpError::param_required(
                kind_label(param.kind),
                param.name.as_deref(),
                request.method(),
                request.path(),
            ));
        }

        normalize(param, value)
    }
}

fn is_missing(kind: ParamType, value: &ParamValue) -> bool {
    if value.is_missing() {
        return true;
    }
    match (kind, value) {
        (ParamType::Body, ParamValue::Text(text)) => text.is_empty(),
        (ParamType::Body, ParamValue::Json(Value::String(text))) => text.is_empty(),
        (ParamType::Body, ParamValue::Json(Value::Object(map))) => map.is_empty(),
        (_, ParamValue::Files(files)) => files.is_empty(),
        _ => false,
    }
}

fn kind_label(kind: ParamType) -> &'static str {
    match kind {
        ParamType::Path => "Path",
        ParamType::Query | ParamType::Queries => "Query",
        ParamType::Header | ParamType::Headers => "Header",
        ParamType::Cookie | ParamType::Cookies => "Cookie",
        ParamType::Body => "Request body",
        ParamType::BodyParam => "Body",
        ParamType::Session => "Session",
        ParamType::UploadedFile => "Uploaded file",
        ParamType::UploadedFiles => "Uploaded files",
        ParamType::Request => "Request",
        ParamType::Response => "Response",
    }
}

/// Coerces a text value to the parameter's declared format.
///
/// Values that are not text pass through untouched. `parse_json` takes
/// precedence over `format`.
pub fn normalize(param: &ParamMetadata, value: ParamValue) -> Result<ParamValue, HttpError> {
    let format = if param.parse_json {
        Some(ParamFormat::Json)
    } else {
        param.format
    };
    let Some(format) = format.filter(|f| *f != ParamFormat::String) else {
        return Ok(value);
    };
    let Some(text) = value.as_text() else {
        return Ok(value);
    };
    let name = param.name.as_deref().unwrap_or(param.kind.as_str());

    let coerced = match format {
        ParamFormat::String | ParamFormat::Json => {
            serde_json::from_str(text).map_err(|_| HttpError::parse_json(text))?
        }
        ParamFormat::Number => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| HttpError::param_normalization(name, "number", text))?,
        ParamFormat::Integer => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| HttpError::param_normalization(name, "integer", text))?,
        ParamFormat::Boolean => match text.trim() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => return Err(HttpError::param_normalization(name, "boolean", text)),
        },
    };
    Ok(ParamValue::Json(coerced))
}
