//! # Hermes Executor
//!
//! Compiles the declarations held in a
//! [`MetadataArgsStorage`](hermes_metadata::MetadataArgsStorage) into
//! registrations on a [`Driver`](hermes_middleware::Driver), and runs
//! registered actions.
//!
//! - [`Executor`]: bootstrap and the four registration phases
//! - [`ActionHandler`]: parameters, handler call, interceptors, response
//! - [`ParamResolver`]: required checks and format coercion
//! - [`ResponseHandler`]: result and error shaping
//!
//! The executor never touches a concrete server; everything goes through
//! the driver trait, so any driver produces the same responses.

#![doc(html_root_url = "https://docs.rs/hermes-executor/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod action_handler;
pub mod executor;
pub mod param_resolver;
pub mod response_handler;

pub use action_handler::ActionHandler;
pub use executor::Executor;
pub use param_resolver::{normalize, ParamResolver};
pub use response_handler::{
    ResponseHandler, DEFAULT_EMPTY_RESULT_CODE, DEFAULT_NULL_RESULT_CODE, DEFAULT_SUCCESS_CODE,
    DEFAULT_UNDEFINED_RESULT_CODE,
};
