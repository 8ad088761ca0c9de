//! Dependency injection.
//!
//! Controllers, middlewares, interceptors and error handlers are materialized
//! through a [`ServiceProvider`]. The bundled [`Container`] stores
//! `Arc`-wrapped services keyed by type; any other container can be plugged in
//! by implementing the trait. When the provider has nothing for a type, the
//! declared default constructor is used, subject to [`ContainerOptions`].
//!
//! # Example
//!
//! ```rust
//! use hermes_core::di::{Container, ServiceProvider, TargetId};
//! use std::sync::Arc;
//!
//! struct QuestionRepository;
//!
//! let mut container = Container::new();
//! container.register(Arc::new(QuestionRepository));
//!
//! let repo: Option<Arc<QuestionRepository>> = container.resolve();
//! assert!(repo.is_some());
//! assert!(container.get(&TargetId::of::<QuestionRepository>()).unwrap().is_some());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A type-erased shared instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Default constructor used when the provider has no instance.
pub type Factory = fn() -> Instance;

/// Identity of a declared type.
#[derive(Clone, Copy)]
pub struct TargetId {
    type_id: TypeId,
    name: &'static str,
}

impl TargetId {
    /// Identity of `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Full type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl PartialEq for TargetId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TargetId {}

impl std::hash::Hash for TargetId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Error when a dependency cannot be resolved.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to inject {type_name}: {reason}")]
pub struct InjectionError {
    /// The type that could not be resolved.
    pub type_name: &'static str,
    /// Why resolution failed.
    pub reason: String,
}

impl InjectionError {
    /// The type has no registered instance and no default constructor.
    pub fn not_registered(target: &TargetId) -> Self {
        Self {
            type_name: target.name(),
            reason: "service not registered".to_string(),
        }
    }

    /// Resolution failed for another reason.
    pub fn custom(target: &TargetId, reason: impl Into<String>) -> Self {
        Self {
            type_name: target.name(),
            reason: reason.into(),
        }
    }
}

/// Something that can hand out instances by type identity.
pub trait ServiceProvider: Send + Sync {
    /// Returns the instance for `target`, `Ok(None)` if it has none.
    fn get(&self, target: &TargetId) -> Result<Option<Instance>, InjectionError>;
}

/// How a user-supplied provider is combined with default construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerOptions {
    /// Construct with the default constructor when the provider returns nothing.
    pub fallback: bool,
    /// Construct with the default constructor when the provider fails.
    pub fallback_on_errors: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            fallback: true,
            fallback_on_errors: false,
        }
    }
}

/// Type-keyed service container.
///
/// Services must be `Send + Sync`; the container is read-only once requests
/// are being served.
#[derive(Default)]
pub struct Container {
    services: HashMap<TypeId, Instance>,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    /// Resolves a service by type.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| s.clone().downcast::<T>().ok())
    }

    /// Resolves a service or fails.
    pub fn resolve_required<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectionError> {
        self.resolve()
            .ok_or_else(|| InjectionError::not_registered(&TargetId::of::<T>()))
    }

    /// Returns true if `T` is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceProvider for Container {
    fn get(&self, target: &TargetId) -> Result<Option<Instance>, InjectionError> {
        Ok(self.services.get(&target.type_id).cloned())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.services.len())
            .finish()
    }
}

/// Materializes `target`, consulting `provider` first.
pub fn get_from_container(
    provider: Option<&dyn ServiceProvider>,
    options: ContainerOptions,
    target: &TargetId,
    factory: Option<Factory>,
) -> Result<Instance, InjectionError> {
    if let Some(provider) = provider {
        match provider.get(target) {
            Ok(Some(instance)) => return Ok(instance),
            Ok(None) if !options.fallback => return Err(InjectionError::not_registered(target)),
            Err(err) if !options.fallback_on_errors => return Err(err),
            Ok(None) | Err(_) => {}
        }
    }
    factory
        .map(|construct| construct())
        .ok_or_else(|| InjectionError::custom(target, "not registered and has no default constructor"))
}

/// Downcasts an instance produced by [`get_from_container`].
pub fn downcast<T: Send + Sync + 'static>(instance: Instance) -> Result<Arc<T>, InjectionError> {
    instance
        .downcast::<T>()
        .map_err(|_| InjectionError::custom(&TargetId::of::<T>(), "instance has a different type"))
}

/// Default constructor for `T`.
pub fn default_factory<T: Default + Send + Sync + 'static>() -> Instance {
    Arc::new(T::default())
}
