//! # Hermes Server
//!
//! [`HyperDriver`] runs the Hermes pipeline on hyper 1.x:
//!
//! - HTTP/1.1 accept loop on Tokio
//! - graceful shutdown through [`ShutdownSignal`]
//! - request timeout and body size limit from [`ServerConfig`]
//!
//! Registration is the executor's job; the driver only serves what was
//! registered on it.

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod error;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use driver::HyperDriver;
pub use error::{ServerError, ServerResult};
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};
