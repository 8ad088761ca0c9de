//! Type-erased action handlers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use hermes_core::di::{downcast, Instance};
use hermes_core::{ActionResult, Args, BoxFuture, HttpError, IntoActionResult};

/// Future returned by an [`ActionFn`].
pub type HandlerFuture = BoxFuture<'static, Result<ActionResult, HttpError>>;
type ErasedActionFn = Arc<dyn Fn(Instance, Args) -> HandlerFuture + Send + Sync>;

/// The business method behind an action.
///
/// Built from a typed async closure receiving the controller instance and
/// the resolved arguments. The controller arrives type-erased and is
/// downcast before the closure runs.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use hermes_core::{Args, HttpError, Json};
/// use hermes_metadata::ActionFn;
///
/// #[derive(Default)]
/// struct QuestionController;
///
/// let one = ActionFn::new(|_ctl: Arc<QuestionController>, args: Args| async move {
///     let id: i64 = args.get(0)?;
///     Ok::<_, HttpError>(Json(serde_json::json!({ "id": id })))
/// });
/// ```
#[derive(Clone)]
pub struct ActionFn {
    inner: ErasedActionFn,
}

impl ActionFn {
    /// Wraps a typed handler.
    pub fn new<C, F, Fut, R, E>(handler: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: IntoActionResult,
        E: Into<HttpError>,
    {
        let handler = Arc::new(handler);
        let inner: ErasedActionFn = Arc::new(move |instance: Instance, args: Args| -> HandlerFuture {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let controller = downcast::<C>(instance)?;
                match handler(controller, args).await {
                    Ok(result) => result.into_action_result(),
                    Err(error) => Err(error.into()),
                }
            })
        });
        Self { inner }
    }

    /// Calls the handler on `controller` with `args`.
    pub fn call(
        &self,
        controller: Instance,
        args: Args,
    ) -> HandlerFuture {
        (self.inner)(controller, args)
    }
}

impl fmt::Debug for ActionFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionFn").finish_non_exhaustive()
    }
}
