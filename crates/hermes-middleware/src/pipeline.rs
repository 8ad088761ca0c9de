//! Per-request pipeline shared by all drivers.
//!
//! ```text
//! global before ─▶ route match ─▶ action before ─▶ handler ─▶ action after ─▶ global after
//!       │               │               │              │             │               │
//!       └───────────────┴──── error ────┴──────────────┴─────────────┴───────────────┘
//!                                         ▼
//!                                   error handlers
//! ```
//!
//! A before middleware that sends the response ends the request. After
//! middlewares run once the response has been written and can observe it.
//! Any stage that records a failure skips the remaining stages; the error
//! handlers then run in registration order until one of them responds.

use std::sync::Arc;
use std::time::Instant;

use http::StatusCode;

use hermes_core::{Action, ActionRequest, ActionResponse, ActionType, HermesError};
use hermes_router::{RouteId, RoutePath, Router};
use hermes_telemetry::{record_error, record_request, InFlightGuard};

use crate::driver::{ActionChain, Driver, ErrorOptions};
use crate::middleware::{ErrorMiddleware, Middleware, MiddlewarePhase};

/// A global middleware, optionally mounted under a route.
#[derive(Clone)]
struct ScopedMiddleware {
    route: Option<RoutePath>,
    middleware: Arc<dyn Middleware>,
}

impl ScopedMiddleware {
    fn applies_to(&self, path: &str) -> bool {
        self.route
            .as_ref()
            .map_or(true, |route| route.matches_prefix(path))
    }
}

#[derive(Clone)]
struct RegisteredAction {
    label: String,
    chain: ActionChain,
}

/// Routes, middlewares and error handlers of one driver.
#[derive(Default)]
pub struct Pipeline {
    router: Router,
    actions: Vec<RegisteredAction>,
    before: Vec<ScopedMiddleware>,
    after: Vec<ScopedMiddleware>,
    error_handlers: Vec<Arc<dyn ErrorMiddleware>>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a global middleware.
    pub fn add_middleware(
        &mut self,
        route: Option<RoutePath>,
        middleware: Arc<dyn Middleware>,
        phase: MiddlewarePhase,
    ) {
        tracing::debug!(
            middleware = middleware.name(),
            route = ?route,
            phase = ?phase,
            "registered global middleware"
        );
        let scoped = ScopedMiddleware { route, middleware };
        match phase {
            MiddlewarePhase::Before => self.before.push(scoped),
            MiddlewarePhase::After => self.after.push(scoped),
        }
    }

    /// Adds an action.
    ///
    /// Literal routes match segment by segment: a static segment beats a
    /// `:param`, which beats a `*wildcard`, whatever the order they were
    /// added in. Between routes that match equally well, and between
    /// literal and pattern routes, the one added first wins.
    pub fn add_route(
        &mut self,
        route: RoutePath,
        action_type: ActionType,
        chain: ActionChain,
    ) -> Result<(), HermesError> {
        let id = RouteId(self.actions.len());
        self.router
            .insert(&route, action_type.method().as_ref(), id)?;
        let label = route.to_string();
        tracing::debug!(route = %label, method = %action_type, "registered action");
        self.actions.push(RegisteredAction { label, chain });
        Ok(())
    }

    /// Adds an error handler after those already added.
    pub fn add_error_handler(&mut self, handler: Arc<dyn ErrorMiddleware>) {
        tracing::debug!(handler = handler.name(), "registered error handler");
        self.error_handlers.push(handler);
    }

    /// Number of registered actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Names of the global middlewares for `phase`, in run order.
    #[must_use]
    pub fn middleware_names(&self, phase: MiddlewarePhase) -> Vec<&str> {
        let list = match phase {
            MiddlewarePhase::Before => &self.before,
            MiddlewarePhase::After => &self.after,
        };
        list.iter().map(|m| m.middleware.name()).collect()
    }

    /// Names of the error handlers, in run order.
    #[must_use]
    pub fn error_handler_names(&self) -> Vec<&str> {
        self.error_handlers.iter().map(|h| h.name()).collect()
    }

    /// Runs one request through the pipeline.
    pub async fn dispatch(&self, driver: &dyn Driver, request: ActionRequest) -> ActionResponse {
        let _in_flight = InFlightGuard::new();
        let started = Instant::now();
        let method = request.method().clone();
        let request_id = request.request_id();
        let mut action = Action::new(request);

        let route = self.run_stages(driver, &mut action).await;
        self.run_error_handlers(&mut action).await;

        if !action.response.is_sent() {
            let status = if route.is_some() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::NOT_FOUND
            };
            tracing::warn!(status = status.as_u16(), "no response written");
            action.response.end(status);
        }

        let status = action.response.status();
        let elapsed = started.elapsed();
        let route_label = route.unwrap_or("<unmatched>");
        record_request(method.as_str(), route_label, status.as_u16(), elapsed);
        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = action.request.path(),
            route = route_label,
            status = status.as_u16(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "request completed"
        );

        action.response
    }

    /// Runs every stage up to the first failure. Returns the matched route.
    async fn run_stages(&self, driver: &dyn Driver, action: &mut Action) -> Option<&str> {
        let path = action.request.path().to_string();

        let global_before = self.scoped(&self.before, &path);
        if !run_middlewares(driver, global_before, action, MiddlewarePhase::Before).await {
            return None;
        }

        let Some(found) = self.router.match_route(action.request.method(), &path) else {
            let global_after = self.scoped(&self.after, &path);
            run_middlewares(driver, global_after, action, MiddlewarePhase::After).await;
            return None;
        };

        let registered = &self.actions[found.route.0];
        let route = Some(registered.label.as_str());
        action.request.set_params(found.params);

        let chain = &registered.chain;
        if !run_middlewares(driver, &chain.before, action, MiddlewarePhase::Before).await {
            return route;
        }

        (chain.handler)(driver, action).await;
        if action.has_failed() {
            return route;
        }

        if !run_middlewares(driver, &chain.after, action, MiddlewarePhase::After).await {
            return route;
        }
        let global_after = self.scoped(&self.after, &path);
        run_middlewares(driver, global_after, action, MiddlewarePhase::After).await;
        route
    }

    async fn run_error_handlers(&self, action: &mut Action) {
        let Some(failure) = action.take_failure() else {
            return;
        };
        record_error(failure.error().name());

        for handler in &self.error_handlers {
            if action.response.is_sent() {
                break;
            }
            handler.handle(&failure, action).await;
        }

        if !action.response.is_sent() {
            tracing::warn!(
                error = %failure.error(),
                status = failure.status().as_u16(),
                "no error handler responded"
            );
            action.response.end(failure.status());
        }
    }

    fn scoped<'a>(&self, list: &'a [ScopedMiddleware], path: &str) -> Vec<&'a Arc<dyn Middleware>> {
        list.iter()
            .filter(|m| m.applies_to(path))
            .map(|m| &m.middleware)
            .collect()
    }
}

/// Runs `middlewares` in order. Returns false when the pipeline must stop.
async fn run_middlewares<'m, I>(
    driver: &dyn Driver,
    middlewares: I,
    action: &mut Action,
    phase: MiddlewarePhase,
) -> bool
where
    I: IntoIterator<Item = &'m Arc<dyn Middleware>>,
    I::IntoIter: Send,
{
    for middleware in middlewares {
        if let Err(error) = middleware.handle(action).await {
            tracing::debug!(
                middleware = middleware.name(),
                error = %error,
                "middleware failed"
            );
            driver.handle_error(ErrorOptions::new(error), action);
            return false;
        }
        if phase == MiddlewarePhase::Before && action.response.is_sent() {
            return false;
        }
    }
    true
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("actions", &self.actions.iter().map(|a| &a.label).collect::<Vec<_>>())
            .field("before", &self.middleware_names(MiddlewarePhase::Before))
            .field("after", &self.middleware_names(MiddlewarePhase::After))
            .field("error_handlers", &self.error_handler_names())
            .finish()
    }
}
