//! Raw declaration records, as stored before compilation.

use hermes_core::di::Factory;
use hermes_core::{ActionType, ParamFormat, ParamType, TargetId};
use hermes_router::RoutePath;

use crate::action_fn::ActionFn;
use crate::component::{ErrorHandlerRef, InterceptorRef, MiddlewareRef};
use crate::directive::ResponseDirective;

/// A declared controller.
#[derive(Debug, Clone)]
pub struct ControllerMetadataArgs {
    /// Controller type.
    pub target: TargetId,
    /// Base route of every action.
    pub route: Option<RoutePath>,
    /// Responses are JSON unless an action says otherwise.
    pub json: bool,
    /// Constructor used when the container has no instance.
    pub factory: Option<Factory>,
}

/// A declared action.
#[derive(Debug, Clone)]
pub struct ActionMetadataArgs {
    /// Owning controller type.
    pub target: TargetId,
    /// Method name, unique within the controller.
    pub method: String,
    /// Own route; absent inherits the controller route.
    pub route: Option<RoutePath>,
    /// HTTP method.
    pub action_type: ActionType,
    /// Business method.
    pub handler: ActionFn,
}

/// A declared handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamMetadataArgs {
    /// Owning controller type.
    pub target: TargetId,
    /// Owning method.
    pub method: String,
    /// Argument position.
    pub index: usize,
    /// Where the value comes from.
    pub kind: ParamType,
    /// Name for named sources.
    pub name: Option<String>,
    /// Absent values are rejected.
    pub required: bool,
    /// Text values are parsed as JSON.
    pub parse_json: bool,
    /// Expected shape of text values.
    pub format: Option<ParamFormat>,
}

/// A middleware binding.
///
/// Without a target the middleware is global; without a method it applies
/// to every action of the target controller.
#[derive(Debug, Clone)]
pub struct UseMetadataArgs {
    /// Controller type.
    pub target: Option<TargetId>,
    /// Action method.
    pub method: Option<String>,
    /// The middleware.
    pub middleware: MiddlewareRef,
    /// Runs after the action instead of before it.
    pub after_action: bool,
}

/// An interceptor binding, scoped like [`UseMetadataArgs`].
#[derive(Debug, Clone)]
pub struct UseInterceptorMetadataArgs {
    /// Controller type.
    pub target: Option<TargetId>,
    /// Action method.
    pub method: Option<String>,
    /// The interceptor.
    pub interceptor: InterceptorRef,
}

/// A response directive on an action.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseHandlerMetadataArgs {
    /// Controller type.
    pub target: TargetId,
    /// Action method.
    pub method: String,
    /// The directive.
    pub directive: ResponseDirective,
}

/// A declared error handler.
#[derive(Debug, Clone)]
pub struct ErrorHandlerMetadataArgs {
    /// The handler.
    pub handler: ErrorHandlerRef,
}
