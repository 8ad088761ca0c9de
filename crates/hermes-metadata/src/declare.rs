//! Typed declaration API.
//!
//! Declarations are written straight into a [`MetadataArgsStorage`]:
//!
//! ```rust
//! use std::sync::Arc;
//! use hermes_core::{Args, HttpError, Json, ParamFormat};
//! use hermes_metadata::{MetadataArgsStorage, Param};
//!
//! #[derive(Default)]
//! struct QuestionController;
//!
//! let mut storage = MetadataArgsStorage::new();
//! storage
//!     .json_controller::<QuestionController>("/questions")
//!     .get("/:id", "one", |_ctl, args: Args| async move {
//!         let id: i64 = args.get(0)?;
//!         Ok::<_, HttpError>(Json(serde_json::json!({ "id": id, "title": "First question" })))
//!     })
//!     .param(Param::path("id").format(ParamFormat::Integer))
//!     .end();
//!
//! assert_eq!(storage.controller_count(), 1);
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use http::StatusCode;

use hermes_core::di::{default_factory, Factory};
use hermes_core::{ActionType, Args, HttpError, IntoActionResult, ParamFormat, ParamType, TargetId};
use hermes_router::RoutePath;

use crate::action_fn::ActionFn;
use crate::args::{
    ActionMetadataArgs, ControllerMetadataArgs, ErrorHandlerMetadataArgs, ParamMetadataArgs,
    ResponseHandlerMetadataArgs, UseInterceptorMetadataArgs, UseMetadataArgs,
};
use crate::component::{ErrorHandlerRef, InterceptorRef, MiddlewareRef};
use crate::directive::{ResponseDirective, TransformOptions};
use crate::storage::MetadataArgsStorage;

/// A parameter declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    kind: ParamType,
    name: Option<String>,
    required: bool,
    parse_json: bool,
    format: Option<ParamFormat>,
}

impl Param {
    /// A parameter of `kind`, optionally named.
    #[must_use]
    pub fn new(kind: ParamType, name: Option<String>) -> Self {
        Self {
            kind,
            name,
            required: false,
            parse_json: false,
            format: None,
        }
    }

    fn named(kind: ParamType, name: impl Into<String>) -> Self {
        Self::new(kind, Some(name.into()))
    }

    /// A path param. Always required.
    #[must_use]
    pub fn path(name: impl Into<String>) -> Self {
        Self::named(ParamType::Path, name).required()
    }

    /// One query value.
    #[must_use]
    pub fn query(name: impl Into<String>) -> Self {
        Self::named(ParamType::Query, name)
    }

    /// Every query value as an object.
    #[must_use]
    pub fn queries() -> Self {
        Self::new(ParamType::Queries, None)
    }

    /// One header.
    #[must_use]
    pub fn header(name: impl Into<String>) -> Self {
        Self::named(ParamType::Header, name)
    }

    /// Every header as an object.
    #[must_use]
    pub fn headers() -> Self {
        Self::new(ParamType::Headers, None)
    }

    /// One cookie.
    #[must_use]
    pub fn cookie(name: impl Into<String>) -> Self {
        Self::named(ParamType::Cookie, name)
    }

    /// Every cookie as an object.
    #[must_use]
    pub fn cookies() -> Self {
        Self::new(ParamType::Cookies, None)
    }

    /// The whole body.
    #[must_use]
    pub fn body() -> Self {
        Self::new(ParamType::Body, None)
    }

    /// One field of the body.
    #[must_use]
    pub fn body_param(name: impl Into<String>) -> Self {
        Self::named(ParamType::BodyParam, name)
    }

    /// The whole session.
    #[must_use]
    pub fn session() -> Self {
        Self::new(ParamType::Session, None)
    }

    /// One session value.
    #[must_use]
    pub fn session_value(name: impl Into<String>) -> Self {
        Self::named(ParamType::Session, name)
    }

    /// One uploaded file.
    #[must_use]
    pub fn file(name: impl Into<String>) -> Self {
        Self::named(ParamType::UploadedFile, name)
    }

    /// Every file uploaded under `name`.
    #[must_use]
    pub fn files(name: impl Into<String>) -> Self {
        Self::named(ParamType::UploadedFiles, name)
    }

    /// The raw request.
    #[must_use]
    pub fn request() -> Self {
        Self::new(ParamType::Request, None)
    }

    /// A handle on the response.
    #[must_use]
    pub fn response() -> Self {
        Self::new(ParamType::Response, None)
    }

    /// Rejects requests without a value.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Parses text values as JSON.
    #[must_use]
    pub fn parse_json(mut self) -> Self {
        self.parse_json = true;
        self
    }

    /// Coerces text values to `format`.
    #[must_use]
    pub fn format(mut self, format: ParamFormat) -> Self {
        self.format = Some(format);
        self
    }
}

impl MetadataArgsStorage {
    /// Declares a controller built with `Default` unless the container has one.
    pub fn controller<C>(&mut self, route: impl Into<RoutePath>) -> ControllerDecl<'_, C>
    where
        C: Default + Send + Sync + 'static,
    {
        ControllerDecl::declare(self, route.into(), false, Some(default_factory::<C>))
    }

    /// Like [`controller`](Self::controller), with JSON responses by default.
    pub fn json_controller<C>(&mut self, route: impl Into<RoutePath>) -> ControllerDecl<'_, C>
    where
        C: Default + Send + Sync + 'static,
    {
        ControllerDecl::declare(self, route.into(), true, Some(default_factory::<C>))
    }

    /// Declares a controller that must be registered in the container.
    pub fn injected_controller<C>(&mut self, route: impl Into<RoutePath>) -> ControllerDecl<'_, C>
    where
        C: Send + Sync + 'static,
    {
        ControllerDecl::declare(self, route.into(), false, None)
    }

    /// Declares a global middleware run before actions.
    pub fn use_before(&mut self, middleware: impl Into<MiddlewareRef>) -> &mut Self {
        self.add_use(UseMetadataArgs {
            target: None,
            method: None,
            middleware: middleware.into(),
            after_action: false,
        });
        self
    }

    /// Declares a global middleware run after actions.
    pub fn use_after(&mut self, middleware: impl Into<MiddlewareRef>) -> &mut Self {
        self.add_use(UseMetadataArgs {
            target: None,
            method: None,
            middleware: middleware.into(),
            after_action: true,
        });
        self
    }

    /// Declares a global interceptor.
    pub fn use_interceptor(&mut self, interceptor: impl Into<InterceptorRef>) -> &mut Self {
        self.add_use_interceptor(UseInterceptorMetadataArgs {
            target: None,
            method: None,
            interceptor: interceptor.into(),
        });
        self
    }

    /// Declares an error handler.
    pub fn error_handler(&mut self, handler: impl Into<ErrorHandlerRef>) -> &mut Self {
        self.add_error_handler(ErrorHandlerMetadataArgs {
            handler: handler.into(),
        });
        self
    }
}

/// Declarations on one controller.
pub struct ControllerDecl<'s, C> {
    storage: &'s mut MetadataArgsStorage,
    args: ControllerMetadataArgs,
    _controller: PhantomData<fn() -> C>,
}

impl<'s, C: Send + Sync + 'static> ControllerDecl<'s, C> {
    fn declare(
        storage: &'s mut MetadataArgsStorage,
        route: RoutePath,
        json: bool,
        factory: Option<Factory>,
    ) -> Self {
        let args = ControllerMetadataArgs {
            target: TargetId::of::<C>(),
            route: Some(route),
            json,
            factory,
        };
        storage.add_controller(args.clone());
        Self {
            storage,
            args,
            _controller: PhantomData,
        }
    }

    /// Makes responses JSON by default.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.args.json = true;
        self.storage.add_controller(self.args.clone());
        self
    }

    /// Declares an action.
    pub fn action<F, Fut, R, E>(
        self,
        action_type: ActionType,
        route: impl Into<RoutePath>,
        method: &str,
        handler: F,
    ) -> ActionDecl<'s, C>
    where
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: IntoActionResult,
        E: Into<HttpError>,
    {
        self.action_fn(action_type, route, method, ActionFn::new(handler))
    }

    /// Declares an action from an existing [`ActionFn`].
    pub fn action_fn(
        self,
        action_type: ActionType,
        route: impl Into<RoutePath>,
        method: &str,
        handler: ActionFn,
    ) -> ActionDecl<'s, C> {
        let route = route.into();
        self.storage.add_action(ActionMetadataArgs {
            target: self.args.target,
            method: method.to_string(),
            route: (!route.is_empty()).then_some(route),
            action_type,
            handler,
        });
        ActionDecl {
            controller: self,
            method: method.to_string(),
            next_index: 0,
        }
    }

    /// Declares a `GET` action.
    pub fn get<F, Fut, R, E>(self, route: impl Into<RoutePath>, method: &str, handler: F) -> ActionDecl<'s, C>
    where
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: IntoActionResult,
        E: Into<HttpError>,
    {
        self.action(ActionType::Get, route, method, handler)
    }

    /// Declares a `POST` action.
    pub fn post<F, Fut, R, E>(self, route: impl Into<RoutePath>, method: &str, handler: F) -> ActionDecl<'s, C>
    where
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: IntoActionResult,
        E: Into<HttpError>,
    {
        self.action(ActionType::Post, route, method, handler)
    }

    /// Declares a `PUT` action.
    pub fn put<F, Fut, R, E>(self, route: impl Into<RoutePath>, method: &str, handler: F) -> ActionDecl<'s, C>
    where
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: IntoActionResult,
        E: Into<HttpError>,
    {
        self.action(ActionType::Put, route, method, handler)
    }

    /// Declares a `PATCH` action.
    pub fn patch<F, Fut, R, E>(self, route: impl Into<RoutePath>, method: &str, handler: F) -> ActionDecl<'s, C>
    where
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: IntoActionResult,
        E: Into<HttpError>,
    {
        self.action(ActionType::Patch, route, method, handler)
    }

    /// Declares a `DELETE` action.
    pub fn delete<F, Fut, R, E>(self, route: impl Into<RoutePath>, method: &str, handler: F) -> ActionDecl<'s, C>
    where
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: IntoActionResult,
        E: Into<HttpError>,
    {
        self.action(ActionType::Delete, route, method, handler)
    }

    /// Declares an action answering every method.
    pub fn all<F, Fut, R, E>(self, route: impl Into<RoutePath>, method: &str, handler: F) -> ActionDecl<'s, C>
    where
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: IntoActionResult,
        E: Into<HttpError>,
    {
        self.action(ActionType::All, route, method, handler)
    }

    /// Middleware run before every action of this controller.
    #[must_use]
    pub fn use_before(self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.bind_use(None, middleware.into(), false)
    }

    /// Middleware run after every action of this controller.
    #[must_use]
    pub fn use_after(self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.bind_use(None, middleware.into(), true)
    }

    /// Interceptor for every action of this controller.
    #[must_use]
    pub fn use_interceptor(self, interceptor: impl Into<InterceptorRef>) -> Self {
        self.bind_interceptor(None, interceptor.into())
    }

    fn bind_use(self, method: Option<String>, middleware: MiddlewareRef, after_action: bool) -> Self {
        self.storage.add_use(UseMetadataArgs {
            target: Some(self.args.target),
            method,
            middleware,
            after_action,
        });
        self
    }

    fn bind_interceptor(self, method: Option<String>, interceptor: InterceptorRef) -> Self {
        self.storage.add_use_interceptor(UseInterceptorMetadataArgs {
            target: Some(self.args.target),
            method,
            interceptor,
        });
        self
    }
}

/// Declarations on one action.
pub struct ActionDecl<'s, C> {
    controller: ControllerDecl<'s, C>,
    method: String,
    next_index: usize,
}

impl<'s, C: Send + Sync + 'static> ActionDecl<'s, C> {
    /// Declares the next handler argument.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        let index = self.next_index;
        self.next_index += 1;
        self.param_at(index, param)
    }

    /// Declares the handler argument at `index`.
    #[must_use]
    pub fn param_at(self, index: usize, param: Param) -> Self {
        self.controller.storage.add_param(ParamMetadataArgs {
            target: self.controller.args.target,
            method: self.method.clone(),
            index,
            kind: param.kind,
            name: param.name,
            required: param.required,
            parse_json: param.parse_json,
            format: param.format,
        });
        self
    }

    /// Declares a response directive.
    #[must_use]
    pub fn response(self, directive: ResponseDirective) -> Self {
        self.controller
            .storage
            .add_response_handler(ResponseHandlerMetadataArgs {
                target: self.controller.args.target,
                method: self.method.clone(),
                directive,
            });
        self
    }

    /// Status for successful results.
    #[must_use]
    pub fn http_code(self, status: StatusCode) -> Self {
        self.response(ResponseDirective::SuccessCode(status))
    }

    /// Status for undefined results.
    #[must_use]
    pub fn on_undefined(self, status: StatusCode) -> Self {
        self.response(ResponseDirective::UndefinedResultCode(status))
    }

    /// Status for `null` results.
    #[must_use]
    pub fn on_null(self, status: StatusCode) -> Self {
        self.response(ResponseDirective::NullResultCode(status))
    }

    /// Status for empty results.
    #[must_use]
    pub fn on_empty(self, status: StatusCode) -> Self {
        self.response(ResponseDirective::EmptyResultCode(status))
    }

    /// Status for errors without their own status.
    #[must_use]
    pub fn error_code(self, status: StatusCode) -> Self {
        self.response(ResponseDirective::ErrorCode(status))
    }

    /// Adds a response header.
    #[must_use]
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response(ResponseDirective::Header {
            name: name.into(),
            value: value.into(),
        })
    }

    /// Sets the `Content-Type`.
    #[must_use]
    pub fn content_type(self, value: impl Into<String>) -> Self {
        self.response(ResponseDirective::ContentType(value.into()))
    }

    /// Sets the `Location` header.
    #[must_use]
    pub fn location(self, value: impl Into<String>) -> Self {
        self.response(ResponseDirective::Location(value.into()))
    }

    /// Redirects instead of writing a body.
    #[must_use]
    pub fn redirect(self, target: impl Into<String>) -> Self {
        self.response(ResponseDirective::Redirect(target.into()))
    }

    /// Renders a template with the result.
    #[must_use]
    pub fn render(self, template: impl Into<String>) -> Self {
        self.response(ResponseDirective::RenderedTemplate(template.into()))
    }

    /// Forces JSON responses.
    #[must_use]
    pub fn json_response(self) -> Self {
        self.response(ResponseDirective::JsonResponse)
    }

    /// Forces text responses.
    #[must_use]
    pub fn text_response(self) -> Self {
        self.response(ResponseDirective::TextResponse)
    }

    /// Serialization options for JSON results.
    #[must_use]
    pub fn transform(self, options: TransformOptions) -> Self {
        self.response(ResponseDirective::TransformOptions(options))
    }

    /// Middleware run before this action.
    #[must_use]
    pub fn use_before(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        let method = Some(self.method.clone());
        self.controller = self.controller.bind_use(method, middleware.into(), false);
        self
    }

    /// Middleware run after this action.
    #[must_use]
    pub fn use_after(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        let method = Some(self.method.clone());
        self.controller = self.controller.bind_use(method, middleware.into(), true);
        self
    }

    /// Interceptor for this action.
    #[must_use]
    pub fn use_interceptor(mut self, interceptor: impl Into<InterceptorRef>) -> Self {
        let method = Some(self.method.clone());
        self.controller = self.controller.bind_interceptor(method, interceptor.into());
        self
    }

    /// Returns to the controller to declare more actions.
    pub fn end(self) -> ControllerDecl<'s, C> {
        self.controller
    }
}
