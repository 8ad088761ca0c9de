//! The hyper-backed driver.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout_at, Instant};

use hermes_core::{ActionRequest, ActionResponse, HttpError, ResponseBody};
use hermes_middleware::{Driver, DriverCore};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// A [`Driver`] serving HTTP/1.1 over hyper.
///
/// Registration goes through the shared [`DriverCore`]; once the executor
/// is done, [`serve`](Self::serve) accepts connections and hands every
/// request to the pipeline. Bodies above the configured limit are refused
/// with `413`. The request timeout covers reading the body and running the
/// pipeline together: a body still arriving at the deadline gets `408`, a
/// pipeline still running gets `504`.
///
/// ```rust,ignore
/// let mut driver = HyperDriver::new(ServerConfig::default());
/// Executor::new(&storage).execute(&mut driver)?;
/// driver.run().await?;
/// ```
#[derive(Debug, Default)]
pub struct HyperDriver {
    core: DriverCore,
    config: ServerConfig,
}

impl HyperDriver {
    /// Creates a driver with `config`.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            core: DriverCore::new(),
            config,
        }
    }

    /// Server settings.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serves on the configured address until SIGTERM or Ctrl+C.
    pub async fn run(self) -> ServerResult<()> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddr {
                addr: self.config.addr().to_string(),
                source,
            })?;
        self.serve(addr, ShutdownSignal::with_os_signals()).await
    }

    /// Serves on `addr` until `shutdown` triggers.
    pub async fn serve(self, addr: SocketAddr, shutdown: ShutdownSignal) -> ServerResult<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` triggers.
    pub async fn serve_listener(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> ServerResult<()> {
        let local = listener.local_addr()?;
        tracing::info!(
            addr = %local,
            actions = self.core.pipeline().action_count(),
            "server listening"
        );

        let driver = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let driver = Arc::clone(&driver);
                        let guard = tracker.track();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            driver.serve_connection(stream, remote, shutdown).await;
                            drop(guard);
                        });
                    }
                    Err(error) => tracing::warn!(%error, "accept failed"),
                },
                () = shutdown.recv() => break,
            }
        }

        let grace = driver.config.shutdown_timeout();
        tracing::info!(open = tracker.open(), ?grace, "shutting down");
        if tokio::time::timeout(grace, tracker.drained()).await.is_err() {
            tracing::warn!(open = tracker.open(), "shutdown grace period elapsed");
        }
        tracing::info!("server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote: SocketAddr,
        shutdown: ShutdownSignal,
    ) {
        let driver = Arc::clone(&self);
        let service = service_fn(move |request: Request<Incoming>| {
            let driver = Arc::clone(&driver);
            async move { Ok::<_, Infallible>(driver.handle_incoming(request).await) }
        });

        let connection = http1::Builder::new()
            .keep_alive(self.config.keep_alive())
            .serve_connection(TokioIo::new(stream), service);
        tokio::pin!(connection);

        let outcome = tokio::select! {
            outcome = connection.as_mut() => outcome,
            () = shutdown.recv() => {
                connection.as_mut().graceful_shutdown();
                connection.await
            }
        };
        if let Err(error) = outcome {
            tracing::debug!(%remote, %error, "connection closed with error");
        }
    }

    async fn handle_incoming(&self, request: Request<Incoming>) -> Response<Full<Bytes>> {
        let deadline = Instant::now() + self.config.request_timeout();
        let (parts, body) = request.into_parts();
        let limited = Limited::new(body, self.config.body_limit());
        let collected = timeout_at(deadline, limited.collect()).await;

        let response = match collected {
            Ok(Ok(body)) => {
                self.dispatch_until(Request::from_parts(parts, body.to_bytes()), deadline)
                    .await
            }
            Ok(Err(error)) => {
                let status = if error.is::<http_body_util::LengthLimitError>() {
                    StatusCode::PAYLOAD_TOO_LARGE
                } else {
                    StatusCode::BAD_REQUEST
                };
                tracing::debug!(%error, %status, "request body rejected");
                self.error_response(HttpError::from_status(status, error.to_string()), status)
            }
            Err(_) => {
                let status = StatusCode::REQUEST_TIMEOUT;
                self.error_response(HttpError::from_status(status, "request body timed out"), status)
            }
        };
        response.map(Full::new)
    }

    /// Runs one buffered request through the pipeline, allowing it the full
    /// request timeout.
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let deadline = Instant::now() + self.config.request_timeout();
        self.dispatch_until(request, deadline).await
    }

    async fn dispatch_until(&self, request: Request<Bytes>, deadline: Instant) -> Response<Bytes> {
        let request = ActionRequest::from_http(request);
        let method = request.method().clone();
        let path = request.path().to_string();
        let pipeline = self.core.pipeline();

        match timeout_at(deadline, pipeline.dispatch(self, request)).await {
            Ok(response) => response.into_http(),
            Err(_) => {
                tracing::warn!(%method, %path, "request timed out");
                let status = StatusCode::GATEWAY_TIMEOUT;
                self.error_response(HttpError::from_status(status, "request timed out"), status)
            }
        }
    }

    fn error_response(&self, error: HttpError, status: StatusCode) -> Response<Bytes> {
        let mut response = ActionResponse::default();
        response.send(status, ResponseBody::Json(self.core.error_payload(&error, status)));
        response.into_http()
    }
}

impl Driver for HyperDriver {
    fn name(&self) -> &'static str {
        "hyper"
    }

    fn core(&self) -> &DriverCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DriverCore {
        &mut self.core
    }
}
