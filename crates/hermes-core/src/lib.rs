//! # Hermes Core
//!
//! Core types shared by every Hermes crate:
//!
//! - [`Action`] - Request-scoped state: the raw [`ActionRequest`] and the
//!   [`ActionResponse`] being built for it
//! - [`HttpError`] - Request-path error with a name and optional status
//! - [`HermesError`] - Startup errors
//! - [`ParamValue`], [`Args`], [`ActionResult`] - Values resolved for and
//!   produced by a handler
//! - [`di`] - Service provider abstraction and the default [`Container`]
//! - [`RequestId`] - UUID v7 request identifier

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod context;
pub mod di;
mod error;
mod param;
mod value;

use std::future::Future;
use std::pin::Pin;

pub use action::{
    Action, ActionFailure, ActionRequest, ActionResponse, ActionType, ResponseBody, Session,
};
pub use context::RequestId;
pub use di::{Container, ContainerOptions, InjectionError, ServiceProvider, TargetId};
pub use error::{HermesError, HermesResult, HttpError};
pub use param::{ParamFormat, ParamSource, ParamType};
pub use value::{
    ActionResult, Args, IntoActionResult, Json, ParamValue, ResponseHandle, UploadedFile,
};

/// Boxed future used at every async seam.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
