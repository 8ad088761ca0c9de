//! Application options.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use hermes_config::{development_mode_from_env, HermesConfig};
use hermes_core::{ContainerOptions, ServiceProvider, TargetId};
use hermes_executor::Executor;
use hermes_extract::MultipartConfig;
use hermes_metadata::MetadataArgsStorage;
use hermes_middleware::DriverOptions;
use hermes_router::RoutePath;
use hermes_server::ServerConfig;

use crate::declarations::Declarations;

/// Everything [`create_server`](crate::create_server) and friends need.
///
/// Defaults: development mode follows `HERMES_ENV` (anything but
/// `production`), the default error handler and result transforms are on,
/// no route prefix, every declared controller is registered.
///
/// ```rust,ignore
/// let options = HermesOptions::new()
///     .route_prefix("/api")
///     .declarations(Declarations::new().with(questions))
///     .container(Arc::new(container));
/// ```
#[derive(Clone)]
pub struct HermesOptions {
    container: Option<Arc<dyn ServiceProvider>>,
    container_options: ContainerOptions,
    development_mode: bool,
    default_error_handler: bool,
    use_class_transformer: bool,
    error_overriding_map: Map<String, Value>,
    route_prefix: Option<RoutePath>,
    template_dir: Option<PathBuf>,
    multipart: MultipartConfig,
    declarations: Declarations,
    controllers: Option<Vec<TargetId>>,
    server: ServerConfig,
}

impl Default for HermesOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl HermesOptions {
    /// Options with the defaults listed above.
    #[must_use]
    pub fn new() -> Self {
        Self {
            container: None,
            container_options: ContainerOptions::default(),
            development_mode: development_mode_from_env(),
            default_error_handler: true,
            use_class_transformer: true,
            error_overriding_map: Map::new(),
            route_prefix: None,
            template_dir: None,
            multipart: MultipartConfig::default(),
            declarations: Declarations::new(),
            controllers: None,
            server: ServerConfig::default(),
        }
    }

    /// Options from a loaded configuration.
    ///
    /// Container, declarations and the controller filter are not part of
    /// the file format and keep their defaults.
    #[must_use]
    pub fn from_config(config: &HermesConfig) -> Self {
        let routing = &config.routing;
        let server = ServerConfig::builder()
            .addr(config.server.addr.clone())
            .shutdown_timeout(Duration::from_secs(config.server.shutdown_timeout_secs))
            .request_timeout(Duration::from_millis(config.server.request_timeout_ms))
            .body_limit(config.server.body_limit)
            .keep_alive(config.server.keep_alive)
            .build();

        Self {
            development_mode: config.development_mode(),
            default_error_handler: routing.default_error_handler,
            use_class_transformer: routing.use_class_transformer,
            error_overriding_map: routing.error_overriding_map.clone(),
            route_prefix: routing
                .route_prefix
                .as_deref()
                .filter(|prefix| !prefix.is_empty())
                .map(RoutePath::literal),
            template_dir: routing.template_dir.clone(),
            server,
            ..Self::new()
        }
    }

    /// Materializes controllers and components through `container`.
    #[must_use]
    pub fn container(mut self, container: Arc<dyn ServiceProvider>) -> Self {
        self.container = Some(container);
        self
    }

    /// How the container combines with default construction.
    #[must_use]
    pub fn container_options(mut self, options: ContainerOptions) -> Self {
        self.container_options = options;
        self
    }

    /// Include error stacks in default error bodies.
    #[must_use]
    pub fn development_mode(mut self, enabled: bool) -> Self {
        self.development_mode = enabled;
        self
    }

    /// Register the built-in error handler after custom ones.
    #[must_use]
    pub fn default_error_handler(mut self, enabled: bool) -> Self {
        self.default_error_handler = enabled;
        self
    }

    /// Apply transform directives to JSON results.
    #[must_use]
    pub fn use_class_transformer(mut self, enabled: bool) -> Self {
        self.use_class_transformer = enabled;
        self
    }

    /// Replaces the payload of errors named `name`.
    #[must_use]
    pub fn override_error(mut self, name: impl Into<String>, payload: Value) -> Self {
        self.error_overriding_map.insert(name.into(), payload);
        self
    }

    /// Replaces the whole error-overriding map.
    #[must_use]
    pub fn error_overriding_map(mut self, map: Map<String, Value>) -> Self {
        self.error_overriding_map = map;
        self
    }

    /// Joined in front of every route.
    #[must_use]
    pub fn route_prefix(mut self, prefix: impl Into<RoutePath>) -> Self {
        self.route_prefix = Some(prefix.into());
        self
    }

    /// Templates for render directives.
    #[must_use]
    pub fn template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    /// Limits for `multipart/form-data` bodies.
    #[must_use]
    pub fn multipart(mut self, config: MultipartConfig) -> Self {
        self.multipart = config;
        self
    }

    /// Registrars run against the store before compilation.
    #[must_use]
    pub fn declarations(mut self, declarations: Declarations) -> Self {
        self.declarations = declarations;
        self
    }

    /// Appends one registrar.
    #[must_use]
    pub fn declare<F>(mut self, registrar: F) -> Self
    where
        F: Fn(&mut MetadataArgsStorage) + Send + Sync + 'static,
    {
        self.declarations.push(registrar);
        self
    }

    /// Registers only these controllers.
    #[must_use]
    pub fn controllers(mut self, controllers: Vec<TargetId>) -> Self {
        self.controllers = Some(controllers);
        self
    }

    /// Adds `C` to the controllers to register.
    #[must_use]
    pub fn controller<C: 'static>(mut self) -> Self {
        self.controllers
            .get_or_insert_with(Vec::new)
            .push(TargetId::of::<C>());
        self
    }

    /// Listener settings for [`create_server`](crate::create_server).
    #[must_use]
    pub fn server(mut self, config: ServerConfig) -> Self {
        self.server = config;
        self
    }

    /// Whether error stacks are included.
    #[must_use]
    pub fn is_development_mode(&self) -> bool {
        self.development_mode
    }

    /// The registrars.
    #[must_use]
    pub fn registered_declarations(&self) -> &Declarations {
        &self.declarations
    }

    /// Listener settings.
    #[must_use]
    pub fn server_config(&self) -> &ServerConfig {
        &self.server
    }

    /// Options handed to the driver at bootstrap.
    #[must_use]
    pub fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            development_mode: self.development_mode,
            default_error_handler: self.default_error_handler,
            use_class_transformer: self.use_class_transformer,
            error_overriding_map: self.error_overriding_map.clone(),
            route_prefix: self.route_prefix.clone(),
            template_dir: self.template_dir.clone(),
            multipart: self.multipart,
        }
    }

    /// An executor over `storage` carrying these options.
    #[must_use]
    pub fn executor<'s>(&self, storage: &'s MetadataArgsStorage) -> Executor<'s> {
        let mut executor = Executor::new(storage)
            .with_options(self.driver_options())
            .with_container_options(self.container_options);
        if let Some(container) = &self.container {
            executor = executor.with_container(Arc::clone(container));
        }
        if let Some(controllers) = &self.controllers {
            executor = executor.with_controllers(controllers.clone());
        }
        executor
    }
}

impl fmt::Debug for HermesOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HermesOptions")
            .field("container", &self.container.is_some())
            .field("container_options", &self.container_options)
            .field("development_mode", &self.development_mode)
            .field("default_error_handler", &self.default_error_handler)
            .field("use_class_transformer", &self.use_class_transformer)
            .field("error_overriding_map", &self.error_overriding_map)
            .field("route_prefix", &self.route_prefix)
            .field("template_dir", &self.template_dir)
            .field("declarations", &self.declarations)
            .field("controllers", &self.controllers)
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_config::ConfigLoader;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = HermesOptions::new().development_mode(false);
        let driver = options.driver_options();
        assert!(!driver.development_mode);
        assert!(driver.default_error_handler);
        assert!(driver.use_class_transformer);
        assert!(driver.route_prefix.is_none());
        assert!(options.registered_declarations().is_empty());
        assert_eq!(options.server_config(), &ServerConfig::default());
    }

    #[test]
    fn test_builder_fills_driver_options() {
        let options = HermesOptions::new()
            .development_mode(true)
            .default_error_handler(false)
            .use_class_transformer(false)
            .route_prefix("/api")
            .template_dir("views")
            .override_error("NotFoundError", json!({ "message": "gone" }));
        let driver = options.driver_options();

        assert!(driver.development_mode);
        assert!(!driver.default_error_handler);
        assert!(!driver.use_class_transformer);
        assert_eq!(driver.route_prefix, Some(RoutePath::literal("/api")));
        assert_eq!(driver.template_dir, Some(PathBuf::from("views")));
        assert_eq!(driver.error_overriding_map["NotFoundError"]["message"], "gone");
    }

    #[test]
    fn test_from_config() {
        let config = ConfigLoader::new()
            .with_string(
                r#"
                [server]
                addr = "127.0.0.1:8088"
                request_timeout_ms = 1500
                body_limit = 512

                [routing]
                route_prefix = "/v2"
                development_mode = false
                default_error_handler = false

                [routing.error_overriding_map.ForbiddenError]
                message = "no"
                "#,
                "toml",
            )
            .unwrap()
            .load()
            .unwrap();
        let options = HermesOptions::from_config(&config);

        assert!(!options.is_development_mode());
        assert_eq!(options.server_config().addr(), "127.0.0.1:8088");
        assert_eq!(options.server_config().request_timeout(), Duration::from_millis(1500));
        assert_eq!(options.server_config().body_limit(), 512);

        let driver = options.driver_options();
        assert!(!driver.default_error_handler);
        assert_eq!(driver.route_prefix, Some(RoutePath::literal("/v2")));
        assert_eq!(driver.error_overriding_map["ForbiddenError"]["message"], "no");
    }

    #[test]
    fn test_empty_prefix_in_config_means_none() {
        let mut config = HermesConfig::default();
        config.routing.route_prefix = Some(String::new());
        assert!(HermesOptions::from_config(&config).driver_options().route_prefix.is_none());
    }

    #[test]
    fn test_controller_filter_accumulates() {
        struct First;
        struct Second;
        let options = HermesOptions::new().controller::<First>().controller::<Second>();
        assert_eq!(
            options.controllers,
            Some(vec![TargetId::of::<First>(), TargetId::of::<Second>()])
        );
    }
}
