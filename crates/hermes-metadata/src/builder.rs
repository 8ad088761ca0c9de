//! Compiles declarations into the metadata model.

use hermes_core::{HermesError, TargetId};
use hermes_router::RoutePath;

use crate::args::{ActionMetadataArgs, ControllerMetadataArgs};
use crate::directive::ResponseDirectives;
use crate::model::{
    ActionMetadata, ControllerMetadata, ParamMetadata, UseInterceptorMetadata, UseMetadata,
};
use crate::storage::MetadataArgsStorage;

/// Builds [`ControllerMetadata`] from a [`MetadataArgsStorage`].
#[derive(Debug)]
pub struct MetadataBuilder<'s> {
    storage: &'s MetadataArgsStorage,
}

impl<'s> MetadataBuilder<'s> {
    /// Creates a builder over `storage`.
    #[must_use]
    pub fn new(storage: &'s MetadataArgsStorage) -> Self {
        Self { storage }
    }

    /// Compiles the controllers among `targets`, or every controller.
    ///
    /// Fails if a full route cannot be built.
    pub fn build_controller_metadata(
        &self,
        targets: Option<&[TargetId]>,
    ) -> Result<Vec<ControllerMetadata>, HermesError> {
        self.storage
            .filter_controller_metadatas_for_controllers(targets)
            .into_iter()
            .map(|controller| self.build_controller(controller))
            .collect()
    }

    fn build_controller(
        &self,
        args: &ControllerMetadataArgs,
    ) -> Result<ControllerMetadata, HermesError> {
        let actions = self
            .storage
            .filter_actions_with_target(&args.target)
            .into_iter()
            .map(|action| self.build_action(args, action))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            controller = %args.target,
            actions = actions.len(),
            "compiled controller"
        );

        Ok(ControllerMetadata {
            target: args.target,
            route: args.route.clone(),
            json: args.json,
            factory: args.factory,
            actions,
        })
    }

    fn build_action(
        &self,
        controller: &ControllerMetadataArgs,
        args: &ActionMetadataArgs,
    ) -> Result<ActionMetadata, HermesError> {
        let storage = self.storage;
        let full_route = RoutePath::join(controller.route.as_ref(), args.route.as_ref())?;

        let params = storage
            .filter_params_with_target_and_method(&args.target, &args.method)
            .into_iter()
            .map(|p| ParamMetadata {
                index: p.index,
                kind: p.kind,
                name: p.name.clone(),
                required: p.required,
                parse_json: p.parse_json,
                format: p.format,
            })
            .collect();

        let uses = storage
            .filter_uses_with_target_and_method(&args.target, &args.method)
            .into_iter()
            .map(|u| UseMetadata {
                middleware: u.middleware.clone(),
                after_action: u.after_action,
            })
            .collect();

        let interceptors = storage
            .global_interceptors()
            .into_iter()
            .chain(storage.filter_interceptors_with_target_and_method(&args.target, &args.method))
            .map(|i| UseInterceptorMetadata {
                interceptor: i.interceptor.clone(),
            })
            .collect();

        let directives = ResponseDirectives::compile(
            storage
                .filter_response_handlers_with_target_and_method(&args.target, &args.method)
                .into_iter()
                .map(|r| &r.directive),
        );

        Ok(ActionMetadata {
            target: args.target,
            method: args.method.clone(),
            route: args.route.clone(),
            action_type: args.action_type,
            handler: args.handler.clone(),
            params,
            uses,
            interceptors,
            directives,
            full_route,
            controller_json: controller.json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_fn::ActionFn;
    use crate::args::{ParamMetadataArgs, ResponseHandlerMetadataArgs};
    use crate::directive::ResponseDirective;
    use hermes_core::{ActionType, Args, HttpError, ParamType};
    use http::StatusCode;
    use std::sync::Arc;

    #[derive(Default)]
    struct QuestionController;

    fn noop() -> ActionFn {
        ActionFn::new(|_ctl: Arc<QuestionController>, _args: Args| async move {
            Ok::<_, HttpError>(())
        })
    }

    fn storage_with(route: Option<RoutePath>, json: bool) -> MetadataArgsStorage {
        let target = TargetId::of::<QuestionController>();
        let mut storage = MetadataArgsStorage::new();
        storage.add_controller(ControllerMetadataArgs {
            target,
            route,
            json,
            factory: None,
        });
        storage.add_action(ActionMetadataArgs {
            target,
            method: "one".into(),
            route: Some("/:id".into()),
            action_type: ActionType::Get,
            handler: noop(),
        });
        storage
    }

    #[test]
    fn test_full_route_and_json_flag() {
        let storage = storage_with(Some("/questions".into()), true);
        let controllers = MetadataBuilder::new(&storage)
            .build_controller_metadata(None)
            .unwrap();

        let action = &controllers[0].actions[0];
        assert_eq!(action.full_route().to_string(), "/questions/:id");
        assert!(action.is_json_typed());
    }

    #[test]
    fn test_text_directive_overrides_json_controller() {
        let mut storage = storage_with(None, true);
        storage.add_response_handler(ResponseHandlerMetadataArgs {
            target: TargetId::of::<QuestionController>(),
            method: "one".into(),
            directive: ResponseDirective::TextResponse,
        });
        storage.add_response_handler(ResponseHandlerMetadataArgs {
            target: TargetId::of::<QuestionController>(),
            method: "one".into(),
            directive: ResponseDirective::ErrorCode(StatusCode::NOT_FOUND),
        });

        let controllers = MetadataBuilder::new(&storage)
            .build_controller_metadata(None)
            .unwrap();
        let action = &controllers[0].actions[0];
        assert!(!action.is_json_typed());
        assert_eq!(action.error_code(), Some(StatusCode::NOT_FOUND));
        assert_eq!(action.full_route().to_string(), "/:id");
    }

    #[test]
    fn test_param_flags() {
        let mut storage = storage_with(None, false);
        for (index, kind) in [ParamType::BodyParam, ParamType::Cookie].into_iter().enumerate() {
            storage.add_param(ParamMetadataArgs {
                target: TargetId::of::<QuestionController>(),
                method: "one".into(),
                index,
                kind,
                name: Some("x".into()),
                required: false,
                parse_json: false,
                format: None,
            });
        }
        let controllers = MetadataBuilder::new(&storage)
            .build_controller_metadata(None)
            .unwrap();
        let action = &controllers[0].actions[0];
        assert!(action.is_body_used());
        assert!(action.is_cookies_used());
        assert!(!action.is_file_used());
        assert!(!action.is_files_used());
    }

    #[test]
    fn test_pattern_route_keeps_flags() {
        let target = TargetId::of::<QuestionController>();
        let mut storage = MetadataArgsStorage::new();
        storage.add_controller(ControllerMetadataArgs {
            target,
            route: Some("/api".into()),
            json: false,
            factory: None,
        });
        storage.add_action(ActionMetadataArgs {
            target,
            method: "pattern".into(),
            route: Some(RoutePath::pattern(r"^/q(\d+)$", "i").unwrap()),
            action_type: ActionType::Get,
            handler: noop(),
        });

        let controllers = MetadataBuilder::new(&storage)
            .build_controller_metadata(None)
            .unwrap();
        let RoutePath::Pattern(pattern) = controllers[0].actions[0].full_route() else {
            panic!("expected a pattern route");
        };
        assert_eq!(pattern.flags(), "i");
        assert!(pattern.is_match("/API/Q12"));
        assert!(!pattern.is_match("/q12"));
    }

    #[test]
    fn test_controller_filter() {
        struct Other;
        let storage = storage_with(None, false);
        let controllers = MetadataBuilder::new(&storage)
            .build_controller_metadata(Some(&[TargetId::of::<Other>()]))
            .unwrap();
        assert!(controllers.is_empty());
    }
}
