//! Test client for in-memory requests.

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use serde::Serialize;

use hermes_core::HermesError;
use hermes_executor::Executor;
use hermes_metadata::MetadataArgsStorage;

use crate::driver::MemoryDriver;
use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Sends requests to a [`MemoryDriver`].
///
/// ```rust,ignore
/// let client = TestClient::from_storage(&storage)?;
/// client.get("/questions/1").send().await.assert_status(StatusCode::OK);
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    driver: Arc<MemoryDriver>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Wraps a driver that already has its routes registered.
    pub fn new(driver: MemoryDriver) -> Self {
        Self {
            driver: Arc::new(driver),
            default_headers: Vec::new(),
        }
    }

    /// Registers everything declared in `storage` with default options.
    pub fn from_storage(storage: &MetadataArgsStorage) -> Result<Self, HermesError> {
        Self::from_executor(&Executor::new(storage), MemoryDriver::new())
    }

    /// Runs `executor` against `driver`.
    pub fn from_executor(
        executor: &Executor<'_>,
        mut driver: MemoryDriver,
    ) -> Result<Self, HermesError> {
        executor.execute(&mut driver)?;
        Ok(Self::new(driver))
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The underlying driver.
    pub fn driver(&self) -> &MemoryDriver {
        &self.driver
    }

    /// Starts a `GET` request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a `POST` request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a `PUT` request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a `PATCH` request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a `DELETE` request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a `HEAD` request.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::HEAD, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let builder = self
            .default_headers
            .iter()
            .fold(TestRequestBuilder::new(method, uri), |builder, (name, value)| {
                builder.header(name, value)
            });
        TestClientRequest {
            client: self,
            builder,
        }
    }
}

/// A request bound to a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Adds a cookie.
    pub fn cookie(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.cookie(name, value);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets a form-urlencoded body.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built; use
    /// [`try_send`](Self::try_send) to get the error instead.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(error) => panic!("test request could not be built: {error}"),
        }
    }

    /// Sends the request, returning build errors.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        let response = self.client.driver.call(request).await;
        Ok(TestResponse::from_http(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{ActionType, ResponseBody};
    use hermes_middleware::{action_callback, ActionChain, Driver};
    use http::StatusCode;

    fn echo_client() -> TestClient {
        let mut driver = MemoryDriver::new();
        let echo = action_callback(|_driver, action| {
            Box::pin(async move {
                let body = serde_json::json!({
                    "method": action.request.method().as_str(),
                    "path": action.request.path(),
                    "token": action.request.header("x-token"),
                    "body": String::from_utf8_lossy(action.request.body()),
                });
                action.response.send(StatusCode::OK, ResponseBody::Json(body));
            })
        });
        driver
            .register_action("/echo".into(), ActionType::All, ActionChain::new(echo))
            .unwrap();
        TestClient::new(driver)
    }

    #[tokio::test]
    async fn test_all_methods_reach_driver() {
        let client = echo_client();
        for method in [Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            let response = client.request(method.clone(), "/echo").send().await;
            response.assert_status(StatusCode::OK);
            assert_eq!(response.json_value().unwrap()["method"], method.as_str());
        }
    }

    #[tokio::test]
    async fn test_default_headers_and_body() {
        let client = echo_client().with_default_header("x-token", "secret");
        let response = client.post("/echo").body("payload").send().await;
        let body = response.json_value().unwrap();
        assert_eq!(body["token"], "secret");
        assert_eq!(body["body"], "payload");
    }

    #[tokio::test]
    async fn test_try_send_reports_build_errors() {
        let client = echo_client();
        let result = client.get("/echo").header("bad header", "x").try_send().await;
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[tokio::test]
    async fn test_from_empty_storage() {
        let storage = MetadataArgsStorage::new();
        let client = TestClient::from_storage(&storage).unwrap();
        client.get("/anything").send().await.assert_status(StatusCode::NOT_FOUND);
    }
}
