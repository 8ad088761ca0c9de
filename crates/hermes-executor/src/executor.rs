//! The compile phase: declarations in, driver registrations out.

use std::sync::Arc;

use hermes_core::di::get_from_container;
use hermes_core::{ContainerOptions, HermesError, ServiceProvider, TargetId};
use hermes_metadata::{ActionMetadata, ComponentRef, MetadataArgsStorage, MetadataBuilder};
use hermes_middleware::{
    ActionChain, DefaultErrorHandler, Driver, DriverOptions, Middleware, MiddlewarePhase,
};
use hermes_router::RoutePath;

use crate::action_handler::ActionHandler;

/// Registers declared controllers, middlewares and error handlers on a
/// driver.
///
/// The phases run in this order, each preserving declaration order:
///
/// 1. [`bootstrap`](Self::bootstrap) applies the driver options
/// 2. [`register_pre_execution_middlewares`](Self::register_pre_execution_middlewares)
/// 3. [`register_actions`](Self::register_actions)
/// 4. [`register_post_execution_middlewares`](Self::register_post_execution_middlewares)
/// 5. [`register_error_handlers`](Self::register_error_handlers)
///
/// [`execute`](Self::execute) runs all of them.
///
/// # Example
///
/// ```rust,ignore
/// let executor = Executor::new(&storage).with_container(Arc::new(container));
/// executor.execute(&mut driver)?;
/// ```
pub struct Executor<'s> {
    storage: &'s MetadataArgsStorage,
    container: Option<Arc<dyn ServiceProvider>>,
    container_options: ContainerOptions,
    controllers: Option<Vec<TargetId>>,
    options: DriverOptions,
}

impl<'s> Executor<'s> {
    /// Creates an executor over `storage` with default options.
    #[must_use]
    pub fn new(storage: &'s MetadataArgsStorage) -> Self {
        Self {
            storage,
            container: None,
            container_options: ContainerOptions::default(),
            controllers: None,
            options: DriverOptions::default(),
        }
    }

    /// Materializes components through `container`.
    #[must_use]
    pub fn with_container(mut self, container: Arc<dyn ServiceProvider>) -> Self {
        self.container = Some(container);
        self
    }

    /// Sets how the container combines with default construction.
    #[must_use]
    pub fn with_container_options(mut self, options: ContainerOptions) -> Self {
        self.container_options = options;
        self
    }

    /// Registers only these controllers.
    #[must_use]
    pub fn with_controllers(mut self, controllers: Vec<TargetId>) -> Self {
        self.controllers = Some(controllers);
        self
    }

    /// Options handed to the driver at bootstrap.
    #[must_use]
    pub fn with_options(mut self, options: DriverOptions) -> Self {
        self.options = options;
        self
    }

    /// Options handed to the driver at bootstrap.
    #[must_use]
    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Runs every phase against `driver`.
    pub fn execute(&self, driver: &mut dyn Driver) -> Result<(), HermesError> {
        self.bootstrap(driver)?;
        self.register_pre_execution_middlewares(driver)?;
        let actions = self.register_actions(driver)?;
        self.register_post_execution_middlewares(driver)?;
        self.register_error_handlers(driver)?;

        tracing::info!(
            driver = driver.name(),
            actions,
            development = self.options.development_mode,
            "executor ready"
        );
        Ok(())
    }

    /// Configures the driver and lets it prepare its resources.
    pub fn bootstrap(&self, driver: &mut dyn Driver) -> Result<(), HermesError> {
        driver.configure(self.options.clone());
        driver.bootstrap()
    }

    /// Registers global middlewares that run before actions.
    pub fn register_pre_execution_middlewares(
        &self,
        driver: &mut dyn Driver,
    ) -> Result<(), HermesError> {
        self.register_global_middlewares(driver, MiddlewarePhase::Before)
    }

    /// Registers global middlewares that run after actions.
    pub fn register_post_execution_middlewares(
        &self,
        driver: &mut dyn Driver,
    ) -> Result<(), HermesError> {
        self.register_global_middlewares(driver, MiddlewarePhase::After)
    }

    fn register_global_middlewares(
        &self,
        driver: &mut dyn Driver,
        phase: MiddlewarePhase,
    ) -> Result<(), HermesError> {
        let after = phase == MiddlewarePhase::After;
        for binding in self.storage.global_uses(after) {
            let middleware = self.resolve(&binding.middleware)?;
            driver.register_middleware(self.options.route_prefix.clone(), middleware, phase);
        }
        Ok(())
    }

    /// Compiles the declarations and registers one handler per action.
    ///
    /// Returns the number of registered actions.
    pub fn register_actions(&self, driver: &mut dyn Driver) -> Result<usize, HermesError> {
        let controllers = MetadataBuilder::new(self.storage)
            .build_controller_metadata(self.controllers.as_deref())?;
        let use_class_transformer = driver.options().use_class_transformer;

        let mut count = 0;
        for controller in controllers {
            let instance = get_from_container(
                self.provider(),
                self.container_options,
                &controller.target,
                controller.factory,
            )?;

            for action in controller.actions {
                let route =
                    RoutePath::join(self.options.route_prefix.as_ref(), Some(action.full_route()))?;
                let action_type = action.action_type;
                let chain = self.build_chain(action, Arc::clone(&instance), use_class_transformer)?;
                driver.register_action(route, action_type, chain)?;
                count += 1;
            }
        }
        Ok(count)
    }

    fn build_chain(
        &self,
        action: ActionMetadata,
        instance: hermes_core::di::Instance,
        use_class_transformer: bool,
    ) -> Result<ActionChain, HermesError> {
        let before = self.resolve_all(action.before_uses().map(|u| &u.middleware))?;
        let after = self.resolve_all(action.after_uses().map(|u| &u.middleware))?;
        let interceptors = action
            .interceptors
            .iter()
            .map(|i| self.resolve(&i.interceptor))
            .collect::<Result<Vec<_>, _>>()?;

        let handler = ActionHandler::new(action, instance, interceptors, use_class_transformer);
        Ok(ActionChain {
            before,
            handler: handler.into_callback(),
            after,
        })
    }

    /// Registers declared error handlers, then the default one if enabled.
    pub fn register_error_handlers(&self, driver: &mut dyn Driver) -> Result<(), HermesError> {
        for binding in self.storage.error_handlers() {
            let handler = self.resolve(&binding.handler)?;
            driver.register_error_handler(handler);
        }
        if driver.options().default_error_handler {
            driver.register_error_handler(Arc::new(DefaultErrorHandler));
        }
        Ok(())
    }

    fn provider(&self) -> Option<&dyn ServiceProvider> {
        self.container.as_deref()
    }

    fn resolve<T: ?Sized>(&self, component: &ComponentRef<T>) -> Result<Arc<T>, HermesError> {
        Ok(component.resolve(self.provider(), self.container_options)?)
    }

    fn resolve_all<'a>(
        &self,
        components: impl Iterator<Item = &'a ComponentRef<dyn Middleware>>,
    ) -> Result<Vec<Arc<dyn Middleware>>, HermesError> {
        components.map(|c| self.resolve(c)).collect()
    }
}

impl std::fmt::Debug for Executor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("controllers", &self.controllers)
            .field("container", &self.container.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
