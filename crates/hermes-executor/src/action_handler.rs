//! The per-action request handler.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;

use hermes_core::di::Instance;
use hermes_core::{Action, ActionResult, Args, HttpError, ParamValue, ResponseHandle};
use hermes_metadata::ActionMetadata;
use hermes_middleware::{action_callback, ActionCallback, Driver, Interceptor};

use crate::param_resolver::ParamResolver;
use crate::response_handler::ResponseHandler;

/// Runs one action for one request.
///
/// Built once per action at registration; every request goes through
/// [`handle`](Self::handle): parameters are resolved, the business method
/// is awaited, interceptors rewrite the result in order and the response
/// handler shapes it. A failure at any step, a handler panic included,
/// ends in a single call to the response handler's error branch.
pub struct ActionHandler {
    action: ActionMetadata,
    controller: Instance,
    interceptors: Vec<Arc<dyn Interceptor>>,
    use_class_transformer: bool,
}

impl ActionHandler {
    /// Creates a handler for `action` bound to a controller instance.
    #[must_use]
    pub fn new(
        action: ActionMetadata,
        controller: Instance,
        interceptors: Vec<Arc<dyn Interceptor>>,
        use_class_transformer: bool,
    ) -> Self {
        Self {
            action,
            controller,
            interceptors,
            use_class_transformer,
        }
    }

    /// The compiled action.
    #[must_use]
    pub fn action(&self) -> &ActionMetadata {
        &self.action
    }

    /// Handles one request.
    pub async fn handle(&self, driver: &dyn Driver, action: &mut Action) {
        let responder = ResponseHandler::new(&self.action, self.use_class_transformer);
        match self.run(driver, action).await {
            Ok((result, handles)) => {
                let mut status = None;
                for handle in &handles {
                    if let Err(error) = handle.apply_headers(&mut action.response) {
                        responder.handle_error(driver, action, error);
                        return;
                    }
                    status = handle.status().or(status);
                }
                responder.handle_success(driver, action, result, status);
            }
            Err(error) => {
                tracing::debug!(
                    action = %self.label(),
                    error = %error,
                    "action failed"
                );
                responder.handle_error(driver, action, error);
            }
        }
    }

    async fn run(
        &self,
        driver: &dyn Driver,
        action: &mut Action,
    ) -> Result<(ActionResult, Vec<ResponseHandle>), HttpError> {
        let args = ParamResolver::new(&self.action)
            .resolve(driver, &action.request)
            .await?;
        let handles = response_handles(&args);

        let call = self.action.handler.call(Arc::clone(&self.controller), args);
        let mut result = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(outcome) => outcome?,
            Err(_) => {
                tracing::error!(action = %self.label(), "action handler panicked");
                return Err(HttpError::internal("action handler panicked"));
            }
        };

        for interceptor in &self.interceptors {
            result = interceptor.intercept(action, result).await?;
        }
        Ok((result, handles))
    }

    fn label(&self) -> String {
        format!("{}.{}", self.action.target, self.action.method)
    }

    /// Wraps the handler into a driver callback.
    #[must_use]
    pub fn into_callback(self) -> ActionCallback {
        let handler = Arc::new(self);
        action_callback(move |driver, action| {
            let handler = Arc::clone(&handler);
            Box::pin(async move { handler.handle(driver, action).await })
        })
    }
}

impl std::fmt::Debug for ActionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandler")
            .field("action", &self.label())
            .field(
                "interceptors",
                &self.interceptors.iter().map(|i| i.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

fn response_handles(args: &Args) -> Vec<ResponseHandle> {
    (0..args.len())
        .filter_map(|index| match args.value(index) {
            ParamValue::Response(handle) => Some(handle.clone()),
            _ => None,
        })
        .collect()
}
