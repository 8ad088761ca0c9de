//! The default error handler.

use hermes_core::{Action, ActionFailure, BoxFuture};

use crate::middleware::ErrorMiddleware;

/// Writes the formatted error body prepared by the driver.
///
/// Registered after any custom error handler, so it only responds when none
/// of them did.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorMiddleware for DefaultErrorHandler {
    fn name(&self) -> &str {
        "DefaultErrorHandler"
    }

    fn handle<'a>(&'a self, failure: &'a ActionFailure, action: &'a mut Action) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if action.response.is_sent() {
                return;
            }
            if failure.status().is_server_error() {
                tracing::error!(
                    error = %failure.error(),
                    status = failure.status().as_u16(),
                    path = action.request.path(),
                    "request failed"
                );
            } else {
                tracing::debug!(
                    error = %failure.error(),
                    status = failure.status().as_u16(),
                    "request rejected"
                );
            }
            action.response.send(failure.status(), failure.body().clone());
        })
    }
}
