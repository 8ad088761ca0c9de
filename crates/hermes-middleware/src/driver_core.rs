//! State and behaviour shared by every driver.

use http::StatusCode;
use serde_json::Value;

use hermes_core::{
    Action, ActionFailure, ActionRequest, HermesError, HttpError, ParamSource, ParamValue,
    ResponseBody,
};

use crate::driver::{DriverOptions, ErrorOptions, SuccessBody, SuccessOptions};
use crate::pipeline::Pipeline;
use crate::template::Templates;

/// Options, pipeline and templates of one driver.
///
/// A driver owns exactly one core. Everything the executor observes about
/// a driver (how parameters are read, how outcomes become responses, which
/// middlewares run around an action) is implemented here, so two drivers
/// only differ in how requests reach [`Pipeline::dispatch`].
#[derive(Debug, Default)]
pub struct DriverCore {
    options: DriverOptions,
    pipeline: Pipeline,
    templates: Templates,
}

impl DriverCore {
    /// Creates a core with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the options.
    pub fn configure(&mut self, options: DriverOptions) {
        self.options = options;
    }

    /// Options in effect.
    #[must_use]
    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Loads the configured template directory.
    pub fn bootstrap(&mut self) -> Result<(), HermesError> {
        if let Some(dir) = &self.options.template_dir {
            self.templates.load_dir(dir)?;
        }
        Ok(())
    }

    /// The request pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The request pipeline, mutably.
    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// Adds a template from source.
    pub fn add_template(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), HermesError> {
        self.templates.add(name, source)
    }

    /// Reads one parameter out of `request`.
    pub async fn extract(
        &self,
        request: &ActionRequest,
        source: &ParamSource,
    ) -> Result<ParamValue, HttpError> {
        hermes_extract::extract(request, source, self.options.multipart)
            .await
            .map_err(HttpError::from)
    }

    /// Writes a successful outcome into the response.
    pub fn handle_success(&self, options: SuccessOptions, action: &mut Action) {
        if action.response.is_sent() {
            tracing::debug!(status = %options.status, "response already sent, skipping result");
            return;
        }

        for (name, value) in &options.headers {
            if let Err(error) = action.response.set_header(name, value) {
                self.handle_error(ErrorOptions::new(error), action);
                return;
            }
        }

        let status = options.status;
        match options.body {
            SuccessBody::Empty => {
                action.response.end(status);
            }
            SuccessBody::Json(value) => {
                action.response.send(status, ResponseBody::Json(value));
            }
            SuccessBody::Text(text) => {
                action.response.send(status, ResponseBody::Text(text));
            }
            SuccessBody::Bytes(bytes) => {
                action.response.send(status, ResponseBody::Bytes(bytes));
            }
            SuccessBody::Redirect(location) => {
                action.response.redirect(&location);
            }
            SuccessBody::Template { name, context } => {
                match self.templates.render(&name, &context) {
                    Ok(html) => {
                        action.response.send(status, ResponseBody::Html(html));
                    }
                    Err(error) => self.handle_error(ErrorOptions::new(error), action),
                }
            }
        }
    }

    /// Formats an error and records it on the action.
    ///
    /// Nothing is written here: the pipeline hands the failure to the
    /// registered error handlers once the current stage returns.
    pub fn handle_error(&self, options: ErrorOptions, action: &mut Action) {
        let ErrorOptions {
            error,
            status,
            json,
        } = options;
        let body = if json {
            ResponseBody::Json(self.error_payload(&error, status))
        } else {
            ResponseBody::Text(error.message().to_string())
        };
        action.fail(ActionFailure::new(error, status, body));
    }

    /// Builds the JSON body for `error`.
    ///
    /// An object in the error-overriding map is merged over the default
    /// payload; any other value replaces it.
    #[must_use]
    pub fn error_payload(&self, error: &HttpError, status: StatusCode) -> Value {
        let mut payload = error.to_payload(status, self.options.development_mode);
        match self.options.error_overriding_map.get(error.name()) {
            Some(Value::Object(overrides)) => {
                for (key, value) in overrides {
                    payload.insert(key.clone(), value.clone());
                }
                Value::Object(payload)
            }
            Some(replacement) => replacement.clone(),
            None => Value::Object(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_TYPE, LOCATION};
    use http::Method;
    use serde_json::json;

    fn action() -> Action {
        Action::new(ActionRequest::new(Method::GET, "/".parse().unwrap()))
    }

    fn core_with(options: DriverOptions) -> DriverCore {
        let mut core = DriverCore::new();
        core.configure(options);
        core
    }

    #[test]
    fn test_success_json_with_headers() {
        let core = DriverCore::new();
        let mut action = action();
        let mut options = SuccessOptions::new(StatusCode::CREATED, SuccessBody::Json(json!({"id": 1})));
        options.headers.push(("x-version".into(), "2".into()));
        core.handle_success(options, &mut action);

        assert_eq!(action.response.status(), StatusCode::CREATED);
        assert_eq!(action.response.headers()["x-version"], "2");
        assert_eq!(
            action.response.headers()[CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
    }

    #[test]
    fn test_success_redirect() {
        let core = DriverCore::new();
        let mut action = action();
        core.handle_success(
            SuccessOptions::new(StatusCode::OK, SuccessBody::Redirect("/questions/2".into())),
            &mut action,
        );
        assert_eq!(action.response.status(), StatusCode::FOUND);
        assert_eq!(action.response.headers()[LOCATION], "/questions/2");
    }

    #[test]
    fn test_success_template() {
        let mut core = DriverCore::new();
        core.add_template("index.html", "Hello {{ name }}").unwrap();
        let mut action = action();
        core.handle_success(
            SuccessOptions::new(
                StatusCode::OK,
                SuccessBody::Template {
                    name: "index.html".into(),
                    context: json!({"name": "Ada"}),
                },
            ),
            &mut action,
        );
        assert_eq!(&action.response.body()[..], b"Hello Ada");
    }

    #[test]
    fn test_missing_template_fails_action() {
        let core = DriverCore::new();
        let mut action = action();
        core.handle_success(
            SuccessOptions::new(
                StatusCode::OK,
                SuccessBody::Template {
                    name: "nope.html".into(),
                    context: Value::Null,
                },
            ),
            &mut action,
        );
        assert!(!action.response.is_sent());
        assert_eq!(
            action.failure().unwrap().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_success_after_sent_is_skipped() {
        let core = DriverCore::new();
        let mut action = action();
        action.response.end(StatusCode::ACCEPTED);
        core.handle_success(
            SuccessOptions::new(StatusCode::OK, SuccessBody::Text("late".into())),
            &mut action,
        );
        assert_eq!(action.response.status(), StatusCode::ACCEPTED);
        assert!(action.response.body().is_empty());
    }

    #[test]
    fn test_error_json_payload() {
        let core = DriverCore::new();
        let mut action = action();
        core.handle_error(ErrorOptions::new(HttpError::not_found("gone")), &mut action);

        let failure = action.failure().unwrap();
        assert_eq!(failure.status(), StatusCode::NOT_FOUND);
        let ResponseBody::Json(body) = failure.body() else {
            panic!("expected json body");
        };
        assert_eq!(body["name"], "NotFoundError");
        assert_eq!(body["message"], "gone");
        assert_eq!(body["status"], 404);
        assert!(body.get("stack").is_none());
    }

    #[test]
    fn test_error_text_payload() {
        let core = DriverCore::new();
        let mut action = action();
        core.handle_error(
            ErrorOptions {
                error: HttpError::bad_request("nope"),
                status: StatusCode::BAD_REQUEST,
                json: false,
            },
            &mut action,
        );
        assert_eq!(
            action.failure().unwrap().body(),
            &ResponseBody::Text("nope".into())
        );
    }

    #[test]
    fn test_error_overriding_map() {
        let mut options = DriverOptions::default();
        options
            .error_overriding_map
            .insert("NotFoundError".into(), json!({"message": "nothing here", "code": 7}));
        options
            .error_overriding_map
            .insert("ForbiddenError".into(), json!("denied"));
        let core = core_with(options);

        let merged = core.error_payload(&HttpError::not_found("gone"), StatusCode::NOT_FOUND);
        assert_eq!(merged["message"], "nothing here");
        assert_eq!(merged["code"], 7);
        assert_eq!(merged["name"], "NotFoundError");

        let replaced = core.error_payload(&HttpError::forbidden("x"), StatusCode::FORBIDDEN);
        assert_eq!(replaced, json!("denied"));
    }

    #[test]
    fn test_development_mode_adds_stack() {
        let core = core_with(DriverOptions {
            development_mode: true,
            ..DriverOptions::default()
        });
        let payload = core.error_payload(&HttpError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(payload["stack"].as_str().unwrap().contains("boom"));
    }

    #[test]
    fn test_bootstrap_without_template_dir() {
        let mut core = DriverCore::new();
        assert!(core.bootstrap().is_ok());
    }
}
