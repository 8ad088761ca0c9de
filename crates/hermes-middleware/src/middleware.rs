//! Middleware, interceptor and error-handler traits.
//!
//! All three work on the request-scoped [`Action`]:
//!
//! - A [`Middleware`] runs before or after an action. Returning an error
//!   sends the request down the error path; sending the response stops the
//!   pipeline.
//! - An [`Interceptor`] rewrites a handler's successful result before the
//!   response is shaped.
//! - An [`ErrorMiddleware`] gets a recorded failure and may write the error
//!   response. Error handlers run in registration order until one responds.
//!
//! # Example
//!
//! ```rust
//! use hermes_core::{Action, BoxFuture, HttpError};
//! use hermes_middleware::Middleware;
//!
//! struct RequireToken;
//!
//! impl Middleware for RequireToken {
//!     fn handle<'a>(&'a self, action: &'a mut Action) -> BoxFuture<'a, Result<(), HttpError>> {
//!         Box::pin(async move {
//!             match action.request.header("x-token") {
//!                 Some(_) => Ok(()),
//!                 None => Err(HttpError::unauthorized("missing token")),
//!             }
//!         })
//!     }
//! }
//! ```

use std::fmt;

use hermes_core::{Action, ActionFailure, ActionResult, BoxFuture, HttpError};

/// Code run before or after an action.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Processes the action.
    fn handle<'a>(&'a self, action: &'a mut Action) -> BoxFuture<'a, Result<(), HttpError>>;
}

/// Rewrites a handler result.
pub trait Interceptor: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Returns the result to use instead of `result`.
    fn intercept<'a>(
        &'a self,
        action: &'a Action,
        result: ActionResult,
    ) -> BoxFuture<'a, Result<ActionResult, HttpError>>;
}

/// Handles a failed request.
pub trait ErrorMiddleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Handles `failure`; writing the response stops the error chain.
    fn handle<'a>(&'a self, failure: &'a ActionFailure, action: &'a mut Action) -> BoxFuture<'a, ()>;
}

/// Before or after the action handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MiddlewarePhase {
    /// Runs before the handler.
    Before,
    /// Runs after the handler succeeded.
    After,
}

/// Middleware built from a closure.
///
/// ```rust
/// use hermes_middleware::FnMiddleware;
///
/// let log = FnMiddleware::new("log", |action| {
///     Box::pin(async move {
///         tracing::info!(path = action.request.path(), "incoming");
///         Ok(())
///     })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Action) -> BoxFuture<'a, Result<(), HttpError>> + Send + Sync + 'static,
{
    /// Wraps `func`.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Action) -> BoxFuture<'a, Result<(), HttpError>> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    fn handle<'a>(&'a self, action: &'a mut Action) -> BoxFuture<'a, Result<(), HttpError>> {
        (self.func)(action)
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Interceptor built from a synchronous closure.
///
/// ```rust
/// use hermes_core::ActionResult;
/// use hermes_middleware::FnInterceptor;
///
/// let shout = FnInterceptor::new("shout", |_action, result| {
///     Ok(match result {
///         ActionResult::Text(text) => ActionResult::Text(text.to_uppercase()),
///         other => other,
///     })
/// });
/// ```
pub struct FnInterceptor<F> {
    name: &'static str,
    func: F,
}

impl<F> FnInterceptor<F>
where
    F: Fn(&Action, ActionResult) -> Result<ActionResult, HttpError> + Send + Sync + 'static,
{
    /// Wraps `func`.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(&Action, ActionResult) -> Result<ActionResult, HttpError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    fn intercept<'a>(
        &'a self,
        action: &'a Action,
        result: ActionResult,
    ) -> BoxFuture<'a, Result<ActionResult, HttpError>> {
        let outcome = (self.func)(action, result);
        Box::pin(async move { outcome })
    }
}

impl<F> fmt::Debug for FnInterceptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Error handler built from a synchronous closure.
pub struct FnErrorMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnErrorMiddleware<F>
where
    F: Fn(&ActionFailure, &mut Action) + Send + Sync + 'static,
{
    /// Wraps `func`.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> ErrorMiddleware for FnErrorMiddleware<F>
where
    F: Fn(&ActionFailure, &mut Action) + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    fn handle<'a>(&'a self, failure: &'a ActionFailure, action: &'a mut Action) -> BoxFuture<'a, ()> {
        (self.func)(failure, action);
        Box::pin(async {})
    }
}

impl<F> fmt::Debug for FnErrorMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnErrorMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn short_type_name(name: &str) -> &str {
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}
