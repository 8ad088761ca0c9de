//! The declaration store.

use hermes_core::TargetId;

use crate::args::{
    ActionMetadataArgs, ControllerMetadataArgs, ErrorHandlerMetadataArgs, ParamMetadataArgs,
    ResponseHandlerMetadataArgs, UseInterceptorMetadataArgs, UseMetadataArgs,
};

/// Every declaration made before bootstrap, in declaration order.
///
/// Insertion does not validate anything. Conflicts are settled when the
/// store is compiled: a controller declared twice keeps its latest
/// declaration, a parameter declared twice at the same position keeps the
/// latest one, and response directives keep the first of each kind.
///
/// The store is passed explicitly to the executor; there is no global
/// instance.
#[derive(Debug, Default, Clone)]
pub struct MetadataArgsStorage {
    controllers: Vec<ControllerMetadataArgs>,
    actions: Vec<ActionMetadataArgs>,
    params: Vec<ParamMetadataArgs>,
    uses: Vec<UseMetadataArgs>,
    interceptors: Vec<UseInterceptorMetadataArgs>,
    response_handlers: Vec<ResponseHandlerMetadataArgs>,
    error_handlers: Vec<ErrorHandlerMetadataArgs>,
}

impl MetadataArgsStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a controller, replacing an earlier declaration of the same type.
    pub fn add_controller(&mut self, args: ControllerMetadataArgs) {
        match self.controllers.iter_mut().find(|c| c.target == args.target) {
            Some(existing) => *existing = args,
            None => self.controllers.push(args),
        }
    }

    /// Declares an action.
    pub fn add_action(&mut self, args: ActionMetadataArgs) {
        self.actions.push(args);
    }

    /// Declares a parameter, replacing one already declared at that position.
    pub fn add_param(&mut self, args: ParamMetadataArgs) {
        let existing = self.params.iter_mut().find(|p| {
            p.target == args.target && p.method == args.method && p.index == args.index
        });
        match existing {
            Some(existing) => *existing = args,
            None => self.params.push(args),
        }
    }

    /// Declares a middleware binding.
    pub fn add_use(&mut self, args: UseMetadataArgs) {
        self.uses.push(args);
    }

    /// Declares an interceptor binding.
    pub fn add_use_interceptor(&mut self, args: UseInterceptorMetadataArgs) {
        self.interceptors.push(args);
    }

    /// Declares a response directive.
    pub fn add_response_handler(&mut self, args: ResponseHandlerMetadataArgs) {
        self.response_handlers.push(args);
    }

    /// Declares an error handler.
    pub fn add_error_handler(&mut self, args: ErrorHandlerMetadataArgs) {
        self.error_handlers.push(args);
    }

    /// Controllers among `targets`, or all of them when `targets` is `None`.
    #[must_use]
    pub fn filter_controller_metadatas_for_controllers(
        &self,
        targets: Option<&[TargetId]>,
    ) -> Vec<&ControllerMetadataArgs> {
        self.controllers
            .iter()
            .filter(|c| targets.map_or(true, |targets| targets.contains(&c.target)))
            .collect()
    }

    /// Actions of `target`.
    #[must_use]
    pub fn filter_actions_with_target(&self, target: &TargetId) -> Vec<&ActionMetadataArgs> {
        self.actions.iter().filter(|a| a.target == *target).collect()
    }

    /// Parameters of one action, ordered by position.
    #[must_use]
    pub fn filter_params_with_target_and_method(
        &self,
        target: &TargetId,
        method: &str,
    ) -> Vec<&ParamMetadataArgs> {
        let mut params: Vec<_> = self
            .params
            .iter()
            .filter(|p| p.target == *target && p.method == method)
            .collect();
        params.sort_by_key(|p| p.index);
        params
    }

    /// Middleware bindings applying to one action: those on the whole
    /// controller and those on the method, in declaration order.
    #[must_use]
    pub fn filter_uses_with_target_and_method(
        &self,
        target: &TargetId,
        method: &str,
    ) -> Vec<&UseMetadataArgs> {
        self.uses
            .iter()
            .filter(|u| applies_to(u.target.as_ref(), u.method.as_deref(), target, method))
            .collect()
    }

    /// Interceptor bindings applying to one action, in declaration order.
    #[must_use]
    pub fn filter_interceptors_with_target_and_method(
        &self,
        target: &TargetId,
        method: &str,
    ) -> Vec<&UseInterceptorMetadataArgs> {
        self.interceptors
            .iter()
            .filter(|i| applies_to(i.target.as_ref(), i.method.as_deref(), target, method))
            .collect()
    }

    /// Response directives of one action, in declaration order.
    #[must_use]
    pub fn filter_response_handlers_with_target_and_method(
        &self,
        target: &TargetId,
        method: &str,
    ) -> Vec<&ResponseHandlerMetadataArgs> {
        self.response_handlers
            .iter()
            .filter(|r| r.target == *target && r.method == method)
            .collect()
    }

    /// Global middleware bindings for one phase.
    #[must_use]
    pub fn global_uses(&self, after_action: bool) -> Vec<&UseMetadataArgs> {
        self.uses
            .iter()
            .filter(|u| u.target.is_none() && u.after_action == after_action)
            .collect()
    }

    /// Global interceptor bindings.
    #[must_use]
    pub fn global_interceptors(&self) -> Vec<&UseInterceptorMetadataArgs> {
        self.interceptors
            .iter()
            .filter(|i| i.target.is_none())
            .collect()
    }

    /// Error handlers in declaration order.
    #[must_use]
    pub fn error_handlers(&self) -> &[ErrorHandlerMetadataArgs] {
        &self.error_handlers
    }

    /// Number of declared controllers.
    #[must_use]
    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Drops every declaration.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn applies_to(
    bound_target: Option<&TargetId>,
    bound_method: Option<&str>,
    target: &TargetId,
    method: &str,
) -> bool {
    bound_target == Some(target) && bound_method.map_or(true, |m| m == method)
}
