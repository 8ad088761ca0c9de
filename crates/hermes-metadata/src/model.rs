//! The compiled metadata model.
//!
//! Produced once by [`MetadataBuilder`](crate::MetadataBuilder) and
//! read-only afterwards. Derived views that depend on several records (the
//! full route, response shaping) are computed during compilation.

use http::StatusCode;

use hermes_core::di::Factory;
use hermes_core::{ActionType, ParamFormat, ParamSource, ParamType, TargetId};
use hermes_router::RoutePath;

use crate::action_fn::ActionFn;
use crate::component::{InterceptorRef, MiddlewareRef};
use crate::directive::{ResponseDirectives, TransformOptions};

/// A compiled controller with its actions.
#[derive(Debug, Clone)]
pub struct ControllerMetadata {
    /// Controller type.
    pub target: TargetId,
    /// Base route.
    pub route: Option<RoutePath>,
    /// Responses are JSON by default.
    pub json: bool,
    /// Constructor used when the container has no instance.
    pub factory: Option<Factory>,
    /// Actions in declaration order.
    pub actions: Vec<ActionMetadata>,
}

/// A compiled parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamMetadata {
    /// Argument position.
    pub index: usize,
    /// Where the value comes from.
    pub kind: ParamType,
    /// Name for named sources.
    pub name: Option<String>,
    /// Absent values are rejected.
    pub required: bool,
    /// Text values are parsed as JSON.
    pub parse_json: bool,
    /// Expected shape of text values.
    pub format: Option<ParamFormat>,
}

impl ParamMetadata {
    /// The extraction source for this parameter.
    ///
    /// `json_body` forces JSON decoding of the body for JSON-typed actions.
    #[must_use]
    pub fn source(&self, json_body: bool) -> ParamSource {
        let source = match &self.name {
            Some(name) => ParamSource::named(self.kind, name.clone()),
            None => ParamSource::new(self.kind),
        };
        source.json_body(json_body)
    }
}

/// A compiled middleware binding.
#[derive(Debug, Clone)]
pub struct UseMetadata {
    /// The middleware.
    pub middleware: MiddlewareRef,
    /// Runs after the action.
    pub after_action: bool,
}

/// A compiled interceptor binding.
#[derive(Debug, Clone)]
pub struct UseInterceptorMetadata {
    /// The interceptor.
    pub interceptor: InterceptorRef,
}

/// A compiled action.
#[derive(Debug, Clone)]
pub struct ActionMetadata {
    /// Owning controller type.
    pub target: TargetId,
    /// Method name.
    pub method: String,
    /// Own route.
    pub route: Option<RoutePath>,
    /// HTTP method.
    pub action_type: ActionType,
    /// Business method.
    pub handler: ActionFn,
    /// Parameters by position.
    pub params: Vec<ParamMetadata>,
    /// Middleware bindings in declaration order.
    pub uses: Vec<UseMetadata>,
    /// Interceptors in run order: global first, then declaration order.
    pub interceptors: Vec<UseInterceptorMetadata>,
    /// Response directives.
    pub directives: ResponseDirectives,
    pub(crate) full_route: RoutePath,
    pub(crate) controller_json: bool,
}

impl ActionMetadata {
    /// Controller route joined with the action route.
    #[must_use]
    pub fn full_route(&self) -> &RoutePath {
        &self.full_route
    }

    /// Whether results and errors are written as JSON.
    #[must_use]
    pub fn is_json_typed(&self) -> bool {
        if self.directives.json {
            true
        } else if self.directives.text {
            false
        } else {
            self.controller_json
        }
    }

    /// Any parameter reads the body.
    #[must_use]
    pub fn is_body_used(&self) -> bool {
        self.uses_param(|kind| matches!(kind, ParamType::Body | ParamType::BodyParam))
    }

    /// A single-file parameter is declared.
    #[must_use]
    pub fn is_file_used(&self) -> bool {
        self.uses_param(|kind| kind == ParamType::UploadedFile)
    }

    /// A multi-file parameter is declared.
    #[must_use]
    pub fn is_files_used(&self) -> bool {
        self.uses_param(|kind| kind == ParamType::UploadedFiles)
    }

    /// Any parameter reads cookies.
    #[must_use]
    pub fn is_cookies_used(&self) -> bool {
        self.uses_param(|kind| matches!(kind, ParamType::Cookie | ParamType::Cookies))
    }

    fn uses_param(&self, pred: impl Fn(ParamType) -> bool) -> bool {
        self.params.iter().any(|p| pred(p.kind))
    }

    /// Headers written on success: `Location`, `Content-Type`, then custom
    /// headers in declaration order.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::with_capacity(self.directives.headers.len() + 2);
        if let Some(location) = &self.directives.location {
            headers.push(("Location".to_string(), location.clone()));
        }
        if let Some(content_type) = &self.directives.content_type {
            headers.push(("Content-Type".to_string(), content_type.clone()));
        }
        headers.extend(self.directives.headers.iter().cloned());
        headers
    }

    /// Redirect target.
    #[must_use]
    pub fn redirect(&self) -> Option<&str> {
        self.directives.redirect.as_deref()
    }

    /// Template to render.
    #[must_use]
    pub fn rendered_template(&self) -> Option<&str> {
        self.directives.rendered_template.as_deref()
    }

    /// Declared success status.
    #[must_use]
    pub fn success_code(&self) -> Option<StatusCode> {
        self.directives.success_code
    }

    /// Declared status for undefined results.
    #[must_use]
    pub fn undefined_result_code(&self) -> Option<StatusCode> {
        self.directives.undefined_result_code
    }

    /// Declared status for `null` results.
    #[must_use]
    pub fn null_result_code(&self) -> Option<StatusCode> {
        self.directives.null_result_code
    }

    /// Declared status for empty results.
    #[must_use]
    pub fn empty_result_code(&self) -> Option<StatusCode> {
        self.directives.empty_result_code
    }

    /// Declared status for errors without their own status.
    #[must_use]
    pub fn error_code(&self) -> Option<StatusCode> {
        self.directives.error_code
    }

    /// Declared serialization options.
    #[must_use]
    pub fn transform_options(&self) -> Option<&TransformOptions> {
        self.directives.transform.as_ref()
    }

    /// Middlewares run before the handler.
    pub fn before_uses(&self) -> impl Iterator<Item = &UseMetadata> {
        self.uses.iter().filter(|u| !u.after_action)
    }

    /// Middlewares run after the handler.
    pub fn after_uses(&self) -> impl Iterator<Item = &UseMetadata> {
        self.uses.iter().filter(|u| u.after_action)
    }
}
