//! Turns action outcomes into driver calls.

use http::StatusCode;
use serde_json::{Map, Value};

use hermes_core::{Action, ActionResult, HttpError};
use hermes_metadata::ActionMetadata;
use hermes_middleware::{Driver, ErrorOptions, SuccessBody, SuccessOptions};

/// Status for undefined results without a directive.
pub const DEFAULT_UNDEFINED_RESULT_CODE: StatusCode = StatusCode::NOT_FOUND;
/// Status for `null` results without a directive.
pub const DEFAULT_NULL_RESULT_CODE: StatusCode = StatusCode::NOT_FOUND;
/// Status for empty results without a directive.
pub const DEFAULT_EMPTY_RESULT_CODE: StatusCode = StatusCode::NO_CONTENT;
/// Status for other results without a directive.
pub const DEFAULT_SUCCESS_CODE: StatusCode = StatusCode::OK;

/// Shapes results and errors of one action according to its directives.
#[derive(Debug, Clone, Copy)]
pub struct ResponseHandler<'m> {
    action: &'m ActionMetadata,
    use_class_transformer: bool,
}

impl<'m> ResponseHandler<'m> {
    /// Creates a handler for `action`.
    #[must_use]
    pub fn new(action: &'m ActionMetadata, use_class_transformer: bool) -> Self {
        Self {
            action,
            use_class_transformer,
        }
    }

    /// Hands a successful result to the driver.
    ///
    /// `status` is a status set by the handler itself; it wins over the
    /// declared and default codes.
    pub fn handle_success(
        &self,
        driver: &dyn Driver,
        action: &mut Action,
        result: ActionResult,
        status: Option<StatusCode>,
    ) {
        driver.handle_success(self.success_options(result, status), action);
    }

    /// Hands an error to the driver.
    pub fn handle_error(&self, driver: &dyn Driver, action: &mut Action, error: HttpError) {
        driver.handle_error(self.error_options(error), action);
    }

    /// Shapes a successful result.
    ///
    /// A redirect directive wins over everything, then a template, then the
    /// undefined, `null` and empty result codes.
    #[must_use]
    pub fn success_options(&self, result: ActionResult, status: Option<StatusCode>) -> SuccessOptions {
        let meta = self.action;
        let headers = meta.headers();

        if let Some(target) = meta.redirect() {
            return SuccessOptions {
                status: StatusCode::FOUND,
                headers,
                body: SuccessBody::Redirect(redirect_location(target, &result)),
            };
        }

        let (code, body) = if let Some(template) = meta.rendered_template() {
            let context = match result {
                ActionResult::Undefined | ActionResult::Null => Value::Object(Map::new()),
                other => self.transform(other.to_json()),
            };
            let body = SuccessBody::Template {
                name: template.to_string(),
                context,
            };
            (meta.success_code().unwrap_or(DEFAULT_SUCCESS_CODE), body)
        } else {
            match result {
                ActionResult::Undefined => (
                    meta.undefined_result_code()
                        .unwrap_or(DEFAULT_UNDEFINED_RESULT_CODE),
                    SuccessBody::Empty,
                ),
                ActionResult::Null => (
                    meta.null_result_code().unwrap_or(DEFAULT_NULL_RESULT_CODE),
                    SuccessBody::Empty,
                ),
                result if result.is_empty() => (
                    meta.empty_result_code().unwrap_or(DEFAULT_EMPTY_RESULT_CODE),
                    SuccessBody::Empty,
                ),
                result => (
                    meta.success_code().unwrap_or(DEFAULT_SUCCESS_CODE),
                    self.body(result),
                ),
            }
        };

        SuccessOptions {
            status: status.unwrap_or(code),
            headers,
            body,
        }
    }

    /// Shapes an error: the error's own status, else the declared error
    /// code, else 500.
    #[must_use]
    pub fn error_options(&self, error: HttpError) -> ErrorOptions {
        let status = error
            .status()
            .or_else(|| self.action.error_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ErrorOptions {
            error,
            status,
            json: self.action.is_json_typed(),
        }
    }

    fn body(&self, result: ActionResult) -> SuccessBody {
        let json = self.action.is_json_typed();
        match result {
            ActionResult::Bytes(bytes) => SuccessBody::Bytes(bytes),
            ActionResult::Text(text) if json => SuccessBody::Json(Value::String(text)),
            ActionResult::Text(text) => SuccessBody::Text(text),
            ActionResult::Json(value) if json => SuccessBody::Json(self.transform(value)),
            ActionResult::Json(Value::String(text)) => SuccessBody::Text(text),
            ActionResult::Json(value) => SuccessBody::Text(self.transform(value).to_string()),
            ActionResult::Undefined | ActionResult::Null => SuccessBody::Empty,
        }
    }

    fn transform(&self, mut value: Value) -> Value {
        if self.use_class_transformer {
            if let Some(options) = self.action.transform_options() {
                options.apply(&mut value);
            }
        }
        value
    }
}

/// Resolves a redirect target against the result.
///
/// A string result replaces the target; `:key` segments are filled from an
/// object result.
fn redirect_location(target: &str, result: &ActionResult) -> String {
    match result.to_json() {
        Value::String(location) if !location.is_empty() => location,
        Value::Object(fields) => {
            let mut location = target.to_string();
            for (key, value) in &fields {
                let replacement = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                location = location.replace(&format!(":{key}"), &replacement);
            }
            location
        }
        _ => target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{ActionType, Args, TargetId};
    use hermes_metadata::{
        ActionFn, MetadataArgsStorage, MetadataBuilder, ResponseDirective, TransformOptions,
    };
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Default)]
    struct Ctl;

    fn action(json: bool, directives: Vec<ResponseDirective>) -> ActionMetadata {
        let mut storage = MetadataArgsStorage::new();
        let mut decl = if json {
            storage.json_controller::<Ctl>("/c")
        } else {
            storage.controller::<Ctl>("/c")
        }
        .action_fn(
            ActionType::Get,
            "/x",
            "x",
            ActionFn::new(|_: Arc<Ctl>, _: Args| async { Ok::<_, HttpError>(()) }),
        );
        for directive in directives {
            decl = decl.response(directive);
        }
        decl.end();
        let mut controllers = MetadataBuilder::new(&storage)
            .build_controller_metadata(Some(&[TargetId::of::<Ctl>()]))
            .unwrap();
        controllers.remove(0).actions.remove(0)
    }

    #[test]
    fn test_default_codes() {
        let meta = action(true, vec![]);
        let handler = ResponseHandler::new(&meta, true);

        let undefined = handler.success_options(ActionResult::Undefined, None);
        assert_eq!(undefined.status, StatusCode::NOT_FOUND);
        assert_eq!(undefined.body, SuccessBody::Empty);

        let null = handler.success_options(ActionResult::Null, None);
        assert_eq!(null.status, StatusCode::NOT_FOUND);

        let empty = handler.success_options(ActionResult::Text(String::new()), None);
        assert_eq!(empty.status, StatusCode::NO_CONTENT);

        let ok = handler.success_options(ActionResult::Json(json!({"id": 1})), None);
        assert_eq!(ok.status, StatusCode::OK);
        assert_eq!(ok.body, SuccessBody::Json(json!({"id": 1})));
    }

    #[test]
    fn test_declared_codes_and_handler_status() {
        let meta = action(
            false,
            vec![
                ResponseDirective::UndefinedResultCode(StatusCode::NO_CONTENT),
                ResponseDirective::SuccessCode(StatusCode::CREATED),
            ],
        );
        let handler = ResponseHandler::new(&meta, true);
        assert_eq!(
            handler.success_options(ActionResult::Undefined, None).status,
            StatusCode::NO_CONTENT
        );
        let created = handler.success_options(ActionResult::Text("hi".into()), None);
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.body, SuccessBody::Text("hi".into()));

        let patched = handler.success_options(ActionResult::Text("hi".into()), Some(StatusCode::ACCEPTED));
        assert_eq!(patched.status, StatusCode::ACCEPTED);
    }

    #[test]
    fn test_text_typed_serializes_objects() {
        let meta = action(false, vec![]);
        let handler = ResponseHandler::new(&meta, true);
        let options = handler.success_options(ActionResult::Json(json!({"a": 1})), None);
        assert_eq!(options.body, SuccessBody::Text(r#"{"a":1}"#.into()));
    }

    #[test]
    fn test_redirect_substitution() {
        let meta = action(true, vec![ResponseDirective::Redirect("/users/:id".into())]);
        let handler = ResponseHandler::new(&meta, true);

        let options = handler.success_options(ActionResult::Json(json!({"id": 7})), None);
        assert_eq!(options.status, StatusCode::FOUND);
        assert_eq!(options.body, SuccessBody::Redirect("/users/7".into()));

        let direct = handler.success_options(ActionResult::Text("/elsewhere".into()), None);
        assert_eq!(direct.body, SuccessBody::Redirect("/elsewhere".into()));

        let plain = handler.success_options(ActionResult::Undefined, None);
        assert_eq!(plain.body, SuccessBody::Redirect("/users/:id".into()));
    }

    #[test]
    fn test_template_and_headers() {
        let meta = action(
            false,
            vec![
                ResponseDirective::RenderedTemplate("index.html".into()),
                ResponseDirective::Header {
                    name: "x-page".into(),
                    value: "index".into(),
                },
            ],
        );
        let handler = ResponseHandler::new(&meta, true);
        let options = handler.success_options(ActionResult::Json(json!({"title": "Q"})), None);
        assert_eq!(
            options.body,
            SuccessBody::Template {
                name: "index.html".into(),
                context: json!({"title": "Q"}),
            }
        );
        assert_eq!(options.headers, vec![("x-page".to_string(), "index".to_string())]);
    }

    #[test]
    fn test_transform_options() {
        let transform = TransformOptions {
            excludes: vec!["password".into()],
            exclude_prefixes: Vec::new(),
        };
        let meta = action(true, vec![ResponseDirective::TransformOptions(transform)]);
        let result = ActionResult::Json(json!({"name": "a", "password": "p"}));

        let on = ResponseHandler::new(&meta, true).success_options(result.clone(), None);
        assert_eq!(on.body, SuccessBody::Json(json!({"name": "a"})));

        let off = ResponseHandler::new(&meta, false).success_options(result, None);
        assert_eq!(off.body, SuccessBody::Json(json!({"name": "a", "password": "p"})));
    }

    #[test]
    fn test_error_status_chain() {
        let meta = action(false, vec![ResponseDirective::ErrorCode(StatusCode::NOT_FOUND)]);
        let handler = ResponseHandler::new(&meta, true);

        let declared = handler.error_options(HttpError::new("NotFound", "no such question"));
        assert_eq!(declared.status, StatusCode::NOT_FOUND);
        assert!(!declared.json);

        let own = handler.error_options(HttpError::forbidden("no"));
        assert_eq!(own.status, StatusCode::FORBIDDEN);

        let plain = action(true, vec![]);
        let fallback = ResponseHandler::new(&plain, true).error_options(HttpError::new("X", "x"));
        assert_eq!(fallback.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(fallback.json);
    }
}
