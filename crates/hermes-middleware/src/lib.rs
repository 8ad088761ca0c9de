//! # Hermes Middleware
//!
//! The request-side runtime shared by every Hermes driver.
//!
//! - [`Middleware`], [`Interceptor`] and [`ErrorMiddleware`]: the extension
//!   points users implement
//! - [`Driver`]: the capability interface a server backend implements
//! - [`DriverCore`]: options, pipeline and templates every driver delegates to
//! - [`Pipeline`]: route matching and the per-request stage order
//! - [`DefaultErrorHandler`]: writes the formatted error response
//!
//! ## Request flow
//!
//! ```text
//! Request → global before → route → action before → handler
//!                                                      ↓
//! Response ← error handlers (on failure) ← global after ← action after
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod driver_core;
pub mod driver;
pub mod error_handler;
pub mod middleware;
pub mod pipeline;
pub mod template;

pub use driver_core::DriverCore;
pub use driver::{
    action_callback, ActionCallback, ActionChain, Driver, DriverOptions, ErrorOptions, SuccessBody,
    SuccessOptions,
};
pub use error_handler::DefaultErrorHandler;
pub use middleware::{
    ErrorMiddleware, FnErrorMiddleware, FnInterceptor, FnMiddleware, Interceptor, Middleware,
    MiddlewarePhase,
};
pub use pipeline::Pipeline;
pub use template::Templates;
