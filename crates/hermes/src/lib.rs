//! # Hermes
//!
//! **Metadata-driven HTTP action dispatcher**
//!
//! Controllers and their actions are declared into a
//! [`MetadataArgsStorage`](hermes_metadata::MetadataArgsStorage); the
//! executor compiles those declarations into route registrations on a
//! driver, and every request runs parameter resolution, middlewares,
//! interceptors, the handler and response shaping.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hermes::prelude::*;
//!
//! #[derive(Default)]
//! struct QuestionController;
//!
//! fn questions(storage: &mut MetadataArgsStorage) {
//!     storage
//!         .json_controller::<QuestionController>("/questions")
//!         .get("/:id", "one", |_ctl, args| async move {
//!             let id: i64 = args.get(0)?;
//!             Ok::<_, HttpError>(Json(json!({ "id": id, "title": "First question" })))
//!         })
//!         .param(Param::path("id").format(ParamFormat::Integer))
//!         .end();
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StartupError> {
//!     let config = ConfigLoader::new().with_optional_file("hermes.toml")?.with_env().load()?;
//!     init_telemetry(&config)?;
//!
//!     let options = HermesOptions::from_config(&config).declare(questions);
//!     run(&MetadataArgsStorage::new(), &options).await
//! }
//! ```
//!
//! ## Request pipeline
//!
//! ```text
//! global before → route match → action before → params → handler
//!                                                            ↓
//! global after ← action after ← response shaping ← interceptors
//! ```
//!
//! Any failure jumps to the error handlers; exactly one response is written.

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod declarations;
mod error;
mod options;

pub use hermes_config as config;
pub use hermes_core as core;
pub use hermes_executor as executor;
pub use hermes_extract as extract;
pub use hermes_metadata as metadata;
pub use hermes_middleware as middleware;
pub use hermes_router as router;
pub use hermes_server as server;
pub use hermes_telemetry as telemetry;

pub use declarations::Declarations;
pub use error::StartupError;
pub use options::HermesOptions;

use hermes_config::HermesConfig;
use hermes_core::HermesError;
use hermes_metadata::MetadataArgsStorage;
use hermes_middleware::Driver;
use hermes_server::HyperDriver;

/// Compiles `storage` plus the option's declarations onto `driver`.
///
/// `storage` is not modified; the registrars run against a copy.
///
/// # Errors
///
/// Fails if a route is invalid, a component cannot be instantiated, or
/// the driver cannot bootstrap.
pub fn create_executor(
    driver: &mut dyn Driver,
    storage: &MetadataArgsStorage,
    options: &HermesOptions,
) -> Result<(), HermesError> {
    let mut compiled = storage.clone();
    options.registered_declarations().apply(&mut compiled);
    tracing::debug!(
        driver = driver.name(),
        controllers = compiled.controller_count(),
        registrars = options.registered_declarations().len(),
        "compiling declarations"
    );
    options.executor(&compiled).execute(driver)
}

/// Registers everything on an existing hyper driver, keeping its own
/// server settings.
///
/// # Errors
///
/// See [`create_executor`].
pub fn use_server(
    driver: &mut HyperDriver,
    storage: &MetadataArgsStorage,
    options: &HermesOptions,
) -> Result<(), HermesError> {
    create_executor(driver, storage, options)
}

/// Creates a hyper driver from the option's server settings and registers
/// everything on it.
///
/// # Errors
///
/// Fails with [`HermesError::DriverUnavailable`] if the listen address is
/// not a socket address, otherwise as [`create_executor`].
pub fn create_server(
    storage: &MetadataArgsStorage,
    options: &HermesOptions,
) -> Result<HyperDriver, HermesError> {
    let config = options.server_config();
    config
        .socket_addr()
        .map_err(|e| HermesError::DriverUnavailable {
            driver: "hyper",
            reason: format!("invalid listen address `{}`: {e}", config.addr()),
        })?;

    let mut driver = HyperDriver::new(config.clone());
    use_server(&mut driver, storage, options)?;
    Ok(driver)
}

/// Creates the server and serves until SIGTERM or Ctrl+C.
///
/// # Errors
///
/// Fails if the server cannot be created or the listener fails.
pub async fn run(
    storage: &MetadataArgsStorage,
    options: &HermesOptions,
) -> Result<(), StartupError> {
    let driver = create_server(storage, options)?;
    driver.run().await?;
    Ok(())
}

/// Installs the log subscriber and the metrics recorder described by
/// `config`.
///
/// # Errors
///
/// Fails if a subscriber or recorder is already installed or the settings
/// are invalid.
pub fn init_telemetry(config: &HermesConfig) -> Result<(), StartupError> {
    hermes_telemetry::init_logging(&config.logging)?;
    hermes_telemetry::init_metrics(&config.metrics)?;
    Ok(())
}

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use hermes::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        create_executor, create_server, init_telemetry, run, use_server, Declarations,
        HermesOptions, StartupError,
    };

    pub use hermes_config::{ConfigLoader, HermesConfig};

    pub use hermes_core::{
        Action, ActionFailure, ActionResult, Args, BoxFuture, Container, ContainerOptions,
        HermesError, HttpError, Json, ParamFormat, ResponseBody, TargetId, UploadedFile,
    };

    pub use hermes_metadata::{
        ErrorHandlerRef, InterceptorRef, MetadataArgsStorage, MiddlewareRef, Param,
        TransformOptions,
    };

    pub use hermes_middleware::{Driver, ErrorMiddleware, Interceptor, Middleware};

    pub use hermes_router::RoutePath;

    pub use hermes_server::{HyperDriver, ServerConfig, ShutdownSignal};
}
