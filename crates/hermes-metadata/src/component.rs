//! References to middlewares, interceptors and error handlers.
//!
//! A declaration either hands over a ready instance or names a type that is
//! materialized through the service provider at bootstrap.

use std::fmt;
use std::sync::Arc;

use hermes_core::di::{default_factory, downcast, get_from_container, Factory};
use hermes_core::{ContainerOptions, InjectionError, ServiceProvider, TargetId};
use hermes_middleware::{ErrorMiddleware, Interceptor, Middleware};

/// Builds an instance of a declared type.
pub type Resolver<T> =
    fn(Option<&dyn ServiceProvider>, ContainerOptions) -> Result<Arc<T>, InjectionError>;

/// An instance, or a type resolved through the container.
pub enum ComponentRef<T: ?Sized> {
    /// A ready instance.
    Instance(Arc<T>),
    /// A type materialized at bootstrap.
    Injected {
        /// The declared type.
        target: TargetId,
        /// Resolves the type.
        resolve: Resolver<T>,
    },
}

impl<T: ?Sized> ComponentRef<T> {
    /// Returns the instance, resolving it if needed.
    pub fn resolve(
        &self,
        provider: Option<&dyn ServiceProvider>,
        options: ContainerOptions,
    ) -> Result<Arc<T>, InjectionError> {
        match self {
            Self::Instance(instance) => Ok(Arc::clone(instance)),
            Self::Injected { resolve, .. } => resolve(provider, options),
        }
    }

    /// The declared type, for injected references.
    #[must_use]
    pub fn target(&self) -> Option<TargetId> {
        match self {
            Self::Instance(_) => None,
            Self::Injected { target, .. } => Some(*target),
        }
    }
}

impl<T: ?Sized> Clone for ComponentRef<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Instance(instance) => Self::Instance(Arc::clone(instance)),
            Self::Injected { target, resolve } => Self::Injected {
                target: *target,
                resolve: *resolve,
            },
        }
    }
}

impl<T: ?Sized> fmt::Debug for ComponentRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("Instance(..)"),
            Self::Injected { target, .. } => f.debug_tuple("Injected").field(target).finish(),
        }
    }
}

/// Reference to a middleware.
pub type MiddlewareRef = ComponentRef<dyn Middleware>;
/// Reference to an interceptor.
pub type InterceptorRef = ComponentRef<dyn Interceptor>;
/// Reference to an error handler.
pub type ErrorHandlerRef = ComponentRef<dyn ErrorMiddleware>;

fn materialize<C: Send + Sync + 'static>(
    provider: Option<&dyn ServiceProvider>,
    options: ContainerOptions,
    factory: Option<Factory>,
) -> Result<Arc<C>, InjectionError> {
    let instance = get_from_container(provider, options, &TargetId::of::<C>(), factory)?;
    downcast::<C>(instance)
}

macro_rules! component_constructors {
    ($bound:ident) => {
        impl ComponentRef<dyn $bound> {
            /// Wraps an instance.
            pub fn instance<C: $bound>(instance: C) -> Self {
                Self::Instance(Arc::new(instance))
            }

            /// Declares `C`, taken from the container or built with `Default`.
            pub fn injected<C: $bound + Default>() -> Self {
                fn resolve<C: $bound + Default>(
                    provider: Option<&dyn ServiceProvider>,
                    options: ContainerOptions,
                ) -> Result<Arc<dyn $bound>, InjectionError> {
                    let instance: Arc<dyn $bound> =
                        materialize::<C>(provider, options, Some(default_factory::<C>))?;
                    Ok(instance)
                }
                Self::Injected {
                    target: TargetId::of::<C>(),
                    resolve: resolve::<C>,
                }
            }

            /// Declares `C`, which must be registered in the container.
            pub fn from_container<C: $bound>() -> Self {
                fn resolve<C: $bound>(
                    provider: Option<&dyn ServiceProvider>,
                    options: ContainerOptions,
                ) -> Result<Arc<dyn $bound>, InjectionError> {
                    let instance: Arc<dyn $bound> = materialize::<C>(provider, options, None)?;
                    Ok(instance)
                }
                Self::Injected {
                    target: TargetId::of::<C>(),
                    resolve: resolve::<C>,
                }
            }
        }

        impl<C: $bound> From<Arc<C>> for ComponentRef<dyn $bound> {
            fn from(instance: Arc<C>) -> Self {
                Self::Instance(instance)
            }
        }
    };
}

component_constructors!(Middleware);
component_constructors!(Interceptor);
component_constructors!(ErrorMiddleware);

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{Action, BoxFuture, Container, HttpError};

    #[derive(Default)]
    struct Counter {
        label: &'static str,
    }

    impl Middleware for Counter {
        fn name(&self) -> &str {
            self.label
        }

        fn handle<'a>(&'a self, _action: &'a mut Action) -> BoxFuture<'a, Result<(), HttpError>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[test]
    fn test_instance_resolves_to_itself() {
        let reference = MiddlewareRef::instance(Counter { label: "given" });
        let resolved = reference.resolve(None, ContainerOptions::default()).unwrap();
        assert_eq!(resolved.name(), "given");
        assert!(reference.target().is_none());
    }

    #[test]
    fn test_injected_prefers_container() {
        let mut container = Container::new();
        container.register(Arc::new(Counter { label: "registered" }));
        let reference = MiddlewareRef::injected::<Counter>();

        let resolved = reference
            .resolve(Some(&container), ContainerOptions::default())
            .unwrap();
        assert_eq!(resolved.name(), "registered");
        assert_eq!(reference.target(), Some(TargetId::of::<Counter>()));
    }

    #[test]
    fn test_injected_falls_back_to_default() {
        let resolved = MiddlewareRef::injected::<Counter>()
            .resolve(Some(&Container::new()), ContainerOptions::default())
            .unwrap();
        assert_eq!(resolved.name(), "");
    }

    #[test]
    fn test_from_container_requires_registration() {
        let reference = MiddlewareRef::from_container::<Counter>();
        assert!(reference
            .resolve(Some(&Container::new()), ContainerOptions::default())
            .is_err());
    }
}
