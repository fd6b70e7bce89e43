//! Factory-based component adapters.
//!
//! This module defines the [`Provider`] struct, which encapsulates a factory
//! function and scope information for creating and managing components that do
//! not need method injection.
//!
//! # Scopes
//!
//! - **Singleton**: A single instance is created per owning container and reused
//! - **Transient**: A new instance is created every time the component is requested
//!
//! # Examples
//!
//! ```
//! use minject::provider::Provider;
//! use minject::scope::Scope;
//!
//! // Create a singleton provider
//! let provider = Provider::singleton(|_container| Ok(42u32));
//! assert_eq!(provider.scope, Scope::Singleton);
//!
//! // Create a transient provider registered under a name
//! let provider = Provider::transient(|_container| Ok("Hello, World!".to_string())).named("greeting");
//! assert_eq!(provider.scope, Scope::Transient);
//! ```

use std::any::Any;
use std::sync::Arc;

use crate::container::{ComponentAdapter, Container};
use crate::error::Error;
use crate::key::{ComponentKey, TypeKey};
use crate::scope::Scope;
use crate::target::Component;

#[cfg(feature = "tracing")]
use tracing::{debug, info};

type Factory = Box<dyn Fn(&dyn Container) -> Result<Component, Error> + Send + Sync + 'static>;

/// A factory function wrapper that manages component creation and lifecycle scope.
///
/// The factory receives the container it is built in, so it can resolve its
/// own dependencies. Resolution errors, including cyclic dependencies, are
/// propagated with `?`.
pub struct Provider {
    pub key: ComponentKey,
    pub scope: Scope,
    pub factory: Factory,
    type_name: &'static str,
}

impl Provider {
    /// Creates a singleton provider, keyed by `T`.
    ///
    /// The instance is created once when first requested and then cached by
    /// the container that owns the registration.
    pub fn singleton<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        #[cfg(feature = "tracing")]
        info!("Creating singleton provider for {}", std::any::type_name::<T>());

        Self::with_scope(Scope::Singleton, factory)
    }

    /// Creates a transient provider, keyed by `T`, building a new instance on each request.
    pub fn transient<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        #[cfg(feature = "tracing")]
        info!("Creating transient provider for {}", std::any::type_name::<T>());

        Self::with_scope(Scope::Transient, factory)
    }

    /// Registers an already-built value.
    pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
        let shared: Component = Arc::new(value);
        Self {
            key: ComponentKey::of::<T>(),
            scope: Scope::Singleton,
            factory: Box::new(move |_| Ok(shared.clone())),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Registers the provider under a name instead of its type.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.key = ComponentKey::named(name);
        self
    }

    fn with_scope<T, F>(scope: Scope, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        Self {
            key: ComponentKey::Type(TypeKey::of::<T>()),
            scope,
            factory: Box::new(move |container| {
                #[cfg(feature = "tracing")]
                debug!("Executing {} factory for {}", scope, std::any::type_name::<T>());

                factory(container).map(|value| Arc::new(value) as Component)
            }),
            type_name: std::any::type_name::<T>(),
        }
    }
}

impl ComponentAdapter for Provider {
    fn key(&self) -> &ComponentKey {
        &self.key
    }

    fn scope(&self) -> Scope {
        self.scope
    }

    fn produce_component(&self, container: &dyn Container, _into: Option<&TypeKey>) -> Result<Component, Error> {
        (self.factory)(container)
    }

    fn descriptor(&self) -> String {
        format!("Provider[{}]", self.type_name)
    }
}
