//! The driver abstraction.
//!
//! A [`Driver`] binds the dispatcher to one HTTP server implementation. The
//! executor only ever talks to this trait: it registers middlewares, actions
//! and error handlers, asks for parameter values, and hands over shaped
//! success or error outcomes. Both bundled drivers delegate all of that to a
//! shared [`DriverCore`], so the request path behaves the same on either.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use serde_json::{Map, Value};

use hermes_core::{
    Action, ActionRequest, ActionType, BoxFuture, HermesError, HttpError, ParamSource, ParamValue,
};
use hermes_extract::MultipartConfig;
use hermes_router::RoutePath;

use crate::driver_core::DriverCore;
use crate::middleware::{ErrorMiddleware, Middleware, MiddlewarePhase};

/// Per-request callback registered for one action.
///
/// The driver passes itself in so the callback can resolve parameters and
/// hand over the outcome without holding a reference to the driver.
pub type ActionCallback =
    Arc<dyn for<'a> Fn(&'a dyn Driver, &'a mut Action) -> BoxFuture<'a, ()> + Send + Sync>;

/// Wraps a closure as an [`ActionCallback`].
pub fn action_callback<F>(callback: F) -> ActionCallback
where
    F: for<'a> Fn(&'a dyn Driver, &'a mut Action) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    Arc::new(callback)
}

/// Everything registered for one route.
#[derive(Clone)]
pub struct ActionChain {
    /// Action-scoped middlewares run before the handler.
    pub before: Vec<Arc<dyn Middleware>>,
    /// The request handler.
    pub handler: ActionCallback,
    /// Action-scoped middlewares run after a successful handler.
    pub after: Vec<Arc<dyn Middleware>>,
}

impl ActionChain {
    /// A chain with no middlewares.
    #[must_use]
    pub fn new(handler: ActionCallback) -> Self {
        Self {
            before: Vec::new(),
            handler,
            after: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ActionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionChain")
            .field("before", &self.before.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("after", &self.after.iter().map(|m| m.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Global settings applied by the executor at bootstrap.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Include error stacks in default error bodies.
    pub development_mode: bool,
    /// The executor registers the default error handler.
    pub default_error_handler: bool,
    /// Apply transform directives to JSON results.
    pub use_class_transformer: bool,
    /// Replacement payloads keyed by error name.
    pub error_overriding_map: Map<String, Value>,
    /// Prefix joined in front of every route.
    pub route_prefix: Option<RoutePath>,
    /// Directory templates are loaded from.
    pub template_dir: Option<PathBuf>,
    /// Multipart limits.
    pub multipart: MultipartConfig,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            development_mode: false,
            default_error_handler: true,
            use_class_transformer: true,
            error_overriding_map: Map::new(),
            route_prefix: None,
            template_dir: None,
            multipart: MultipartConfig::default(),
        }
    }
}

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum SuccessBody {
    /// No body.
    Empty,
    /// JSON document.
    Json(Value),
    /// Plain text.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
    /// `302` redirect to a location.
    Redirect(String),
    /// Template rendered with a context.
    Template {
        /// Template name.
        name: String,
        /// Render context.
        context: Value,
    },
}

/// A shaped successful outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessOptions {
    /// Response status.
    pub status: StatusCode,
    /// Headers written before the body.
    pub headers: Vec<(String, String)>,
    /// Body.
    pub body: SuccessBody,
}

impl SuccessOptions {
    /// Outcome with no headers.
    #[must_use]
    pub fn new(status: StatusCode, body: SuccessBody) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }
}

/// A shaped error outcome.
#[derive(Debug)]
pub struct ErrorOptions {
    /// The error.
    pub error: HttpError,
    /// Status for the error response.
    pub status: StatusCode,
    /// Format the body as JSON; otherwise the message is sent as text.
    pub json: bool,
}

impl ErrorOptions {
    /// JSON error using the error's own status, or `500`.
    #[must_use]
    pub fn new(error: HttpError) -> Self {
        let status = error.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            error,
            status,
            json: true,
        }
    }
}

/// An HTTP server backend.
///
/// Implementors provide [`Driver::core`] and [`Driver::core_mut`]; every
/// other operation has a provided implementation on top of [`DriverCore`].
/// A backend overrides them only where its server genuinely differs.
pub trait Driver: Send + Sync {
    /// Backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Shared state.
    fn core(&self) -> &DriverCore;

    /// Shared state, mutably.
    fn core_mut(&mut self) -> &mut DriverCore;

    /// Applies global options.
    fn configure(&mut self, options: DriverOptions) {
        self.core_mut().configure(options);
    }

    /// Options in effect.
    fn options(&self) -> &DriverOptions {
        self.core().options()
    }

    /// Checks the backend can serve and loads resources.
    fn bootstrap(&mut self) -> Result<(), HermesError> {
        self.core_mut().bootstrap()
    }

    /// Registers a global middleware, scoped to `route` when given.
    fn register_middleware(
        &mut self,
        route: Option<RoutePath>,
        middleware: Arc<dyn Middleware>,
        phase: MiddlewarePhase,
    ) {
        self.core_mut()
            .pipeline_mut()
            .add_middleware(route, middleware, phase);
    }

    /// Registers an action on `route` for `action_type`.
    fn register_action(
        &mut self,
        route: RoutePath,
        action_type: ActionType,
        chain: ActionChain,
    ) -> Result<(), HermesError> {
        self.core_mut()
            .pipeline_mut()
            .add_route(route, action_type, chain)
    }

    /// Registers an error handler after those already registered.
    fn register_error_handler(&mut self, handler: Arc<dyn ErrorMiddleware>) {
        self.core_mut().pipeline_mut().add_error_handler(handler);
    }

    /// Reads one parameter value out of the request.
    fn get_param_from_request<'a>(
        &'a self,
        request: &'a ActionRequest,
        source: &'a ParamSource,
    ) -> BoxFuture<'a, Result<ParamValue, HttpError>> {
        Box::pin(self.core().extract(request, source))
    }

    /// Writes a successful outcome.
    fn handle_success(&self, options: SuccessOptions, action: &mut Action) {
        self.core().handle_success(options, action);
    }

    /// Records an error outcome for the error handlers.
    fn handle_error(&self, options: ErrorOptions, action: &mut Action) {
        self.core().handle_error(options, action);
    }
}
