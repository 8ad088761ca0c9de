//! # Hermes Metadata
//!
//! Declarations of controllers, actions, parameters, middleware bindings and
//! response directives, and their compilation into a read-only model.
//!
//! Declarations accumulate in a [`MetadataArgsStorage`], either through the
//! raw `add_*` methods or the typed builders in [`declare`].
//! [`MetadataBuilder`] compiles the store into [`ControllerMetadata`] once, at
//! bootstrap: full routes are joined, directives merged and middleware
//! bindings resolved to the actions they apply to.

#![doc(html_root_url = "https://docs.rs/hermes-metadata/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod action_fn;
pub mod args;
pub mod builder;
pub mod component;
pub mod declare;
pub mod directive;
pub mod model;
pub mod storage;

pub use action_fn::{ActionFn, HandlerFuture};
pub use args::{
    ActionMetadataArgs, ControllerMetadataArgs, ErrorHandlerMetadataArgs, ParamMetadataArgs,
    ResponseHandlerMetadataArgs, UseInterceptorMetadataArgs, UseMetadataArgs,
};
pub use builder::MetadataBuilder;
pub use component::{ComponentRef, ErrorHandlerRef, InterceptorRef, MiddlewareRef, Resolver};
pub use declare::{ActionDecl, ControllerDecl, Param};
pub use directive::{ResponseDirective, ResponseDirectives, ResponseHandlerType, TransformOptions};
pub use model::{
    ActionMetadata, ControllerMetadata, ParamMetadata, UseInterceptorMetadata, UseMetadata,
};
pub use storage::MetadataArgsStorage;
