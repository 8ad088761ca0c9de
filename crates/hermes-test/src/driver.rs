//! The in-process driver.

use bytes::Bytes;
use http::{Request, Response};

use hermes_core::{ActionRequest, HermesError};
use hermes_middleware::{Driver, DriverCore};

/// A [`Driver`] that serves requests handed to it directly.
///
/// No socket is involved: [`call`](Self::call) runs the request through the
/// same pipeline a network driver uses, so responses are identical.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    core: DriverCore,
}

impl MemoryDriver {
    /// Creates an empty driver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a template available to rendered-template actions.
    pub fn with_template(
        mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, HermesError> {
        self.core.add_template(name, source)?;
        Ok(self)
    }

    /// Dispatches one request.
    pub async fn call(&self, request: Request<Bytes>) -> Response<Bytes> {
        let request = ActionRequest::from_http(request);
        self.core
            .pipeline()
            .dispatch(self, request)
            .await
            .into_http()
    }
}

impl Driver for MemoryDriver {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn core(&self) -> &DriverCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DriverCore {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{ActionType, ResponseBody};
    use hermes_middleware::{action_callback, ActionChain};
    use http::StatusCode;

    #[tokio::test]
    async fn test_call_runs_pipeline() {
        let mut driver = MemoryDriver::new();
        let ping = action_callback(|_driver, action| {
            Box::pin(async move {
                action
                    .response
                    .send(StatusCode::OK, ResponseBody::Text("pong".to_string()));
            })
        });
        driver
            .register_action("/ping".into(), ActionType::Get, ActionChain::new(ping))
            .unwrap();

        let response = driver
            .call(Request::get("/ping").body(Bytes::new()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"pong");

        let missing = driver
            .call(Request::get("/pong").body(Bytes::new()).unwrap())
            .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bad_template_is_rejected() {
        let result = MemoryDriver::new().with_template("broken", "{% if %}");
        assert!(result.is_err());
    }
}
