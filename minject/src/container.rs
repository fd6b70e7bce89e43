//! Dependency container.
//!
//! The injector only needs a small surface from its container: look up or
//! build a component by key, and tell containers apart by identity so the
//! recursion guard can distinguish "same container again" from a nested one.
//! That surface is the [`Container`] trait.
//!
//! [`DefaultContainer`] is the implementation shipped with the crate: a
//! hierarchy of registries of [`ComponentAdapter`]s where a child falls back to
//! its parent, singletons are cached by the container owning the registration,
//! and every build goes through the [`RecursionGuard`].
//!
//! # Examples
//!
//! ```
//! use minject::container::{ContainerExt, DefaultContainer};
//! use minject::provider::Provider;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: std::sync::Arc<Database>,
//! }
//!
//! let container = DefaultContainer::root();
//! container
//!     .register(Provider::singleton(|_| Ok(Database { url: "postgres://localhost".into() })))
//!     .unwrap();
//! container
//!     .register(Provider::transient(|c| Ok(UserService { db: c.resolve::<Database>()? })))
//!     .unwrap();
//!
//! let users = container.resolve::<UserService>().unwrap();
//! assert_eq!(users.db.url, "postgres://localhost");
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Error;
use crate::key::{ComponentKey, TypeKey};
use crate::resolve_guard::{GuardId, RecursionGuard};
use crate::scope::Scope;
use crate::statics::StaticsRegistry;
use crate::target::Component;

#[cfg(feature = "tracing")]
use tracing::{debug, info};

/// Identity of a container instance, compared by address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContainerId(usize);

impl ContainerId {
    pub fn from_ptr<T: ?Sized>(value: &T) -> Self {
        ContainerId(value as *const T as *const () as usize)
    }
}

/// Component lookup as seen by injectors and parameter strategies.
pub trait Container: Send + Sync {
    /// Looks up or builds the component registered under `key`.
    ///
    /// `Ok(None)` means nothing is registered under that key.
    fn component(&self, key: &ComponentKey, into: Option<&TypeKey>) -> Result<Option<Component>, Error>;

    /// Identity used by the recursion guard to tell containers apart.
    ///
    /// The default is the address of `self`, which changes when the value is
    /// moved and is shared by zero-sized containers. Implementors that can be
    /// moved while a build is running, or that are zero-sized, must override
    /// this with the address of something stable, as [`DefaultContainer`]
    /// does with its shared state.
    fn id(&self) -> ContainerId {
        ContainerId::from_ptr(self)
    }
}

/// Typed lookups on any [`Container`].
pub trait ContainerExt {
    fn resolve<C: Any + Send + Sync>(&self) -> Result<Arc<C>, Error>;

    fn resolve_named<C: Any + Send + Sync>(&self, name: &str) -> Result<Arc<C>, Error>;
}

impl<K: Container + ?Sized> ContainerExt for K {
    fn resolve<C: Any + Send + Sync>(&self) -> Result<Arc<C>, Error> {
        resolve_key(self, &ComponentKey::of::<C>())
    }

    fn resolve_named<C: Any + Send + Sync>(&self, name: &str) -> Result<Arc<C>, Error> {
        resolve_key(self, &ComponentKey::named(name))
    }
}

fn resolve_key<K, C>(container: &K, key: &ComponentKey) -> Result<Arc<C>, Error>
where
    K: Container + ?Sized,
    C: Any + Send + Sync,
{
    container
        .component(key, None)?
        .ok_or_else(|| Error::component_not_found(&key.to_string()))?
        .downcast::<C>()
        .map_err(|_| Error::type_mismatch(std::any::type_name::<C>(), &key.to_string()))
}

/// Something a container can ask to build a component.
pub trait ComponentAdapter: Send + Sync {
    fn key(&self) -> &ComponentKey;

    fn scope(&self) -> Scope {
        Scope::Transient
    }

    fn produce_component(&self, container: &dyn Container, into: Option<&TypeKey>) -> Result<Component, Error>;

    fn descriptor(&self) -> String;
}

/// Something that populates class-scoped state once per statics registry.
pub trait StaticInjector: Send + Sync {
    fn inject_statics(&self, container: &dyn Container, into: &TypeKey, statics: &StaticsRegistry) -> Result<(), Error>;

    /// The type whose static injection this performs.
    fn implementation(&self) -> &TypeKey;

    fn descriptor(&self) -> String;
}

struct Registration {
    adapter: Arc<dyn ComponentAdapter>,
    guard: GuardId,
}

struct ContainerInner {
    parent: Option<Arc<ContainerInner>>,
    registrations: RwLock<HashMap<ComponentKey, Arc<Registration>>>,
    instances: RwLock<HashMap<ComponentKey, Component>>,
    static_injectors: RwLock<Vec<Arc<dyn StaticInjector>>>,
}

impl ContainerInner {
    fn new(parent: Option<Arc<ContainerInner>>) -> Self {
        Self {
            parent,
            registrations: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            static_injectors: RwLock::new(Vec::new()),
        }
    }
}

/// Hierarchical container of component adapters.
///
/// Cloning yields another handle to the same container.
#[derive(Clone)]
pub struct DefaultContainer {
    inner: Arc<ContainerInner>,
}

impl std::fmt::Debug for DefaultContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultContainer")
            .field("parent", &self.inner.parent.is_some())
            .field("registrations", &self.inner.registrations.read().len())
            .field("instances", &self.inner.instances.read().len())
            .field("static_injectors", &self.inner.static_injectors.read().len())
            .finish()
    }
}

impl Default for DefaultContainer {
    fn default() -> Self {
        Self::root()
    }
}

impl DefaultContainer {
    pub fn root() -> Self {
        Self {
            inner: Arc::new(ContainerInner::new(None)),
        }
    }

    /// A child container; lookups it cannot satisfy go to `self`.
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(ContainerInner::new(Some(self.inner.clone()))),
        }
    }

    pub fn register<A: ComponentAdapter + 'static>(&self, adapter: A) -> Result<(), Error> {
        self.register_shared(Arc::new(adapter))
    }

    /// Registers an adapter that may also be held elsewhere, e.g. as a static injector.
    pub fn register_shared(&self, adapter: Arc<dyn ComponentAdapter>) -> Result<(), Error> {
        let key = adapter.key().clone();
        let mut registrations = self.inner.registrations.write();
        if registrations.contains_key(&key) {
            return Err(Error::component_already_registered(&key.to_string()));
        }

        #[cfg(feature = "tracing")]
        info!("Registering {} as {} ({})", adapter.descriptor(), key, adapter.scope());

        registrations.insert(
            key,
            Arc::new(Registration {
                adapter,
                guard: GuardId::next(),
            }),
        );
        Ok(())
    }

    /// Adds an injector to the static injection pass run by [`inject_statics`](Self::inject_statics).
    pub fn add_static_injector(&self, injector: Arc<dyn StaticInjector>) {
        #[cfg(feature = "tracing")]
        info!("Adding static injector {}", injector.descriptor());

        self.inner.static_injectors.write().push(injector);
    }

    /// Runs every static injector of this container and its ancestors, parents first.
    ///
    /// Injectors that already ran against `statics` skip their targets.
    pub fn inject_statics(&self, statics: &StaticsRegistry) -> Result<(), Error> {
        if let Some(parent) = &self.inner.parent {
            DefaultContainer { inner: parent.clone() }.inject_statics(statics)?;
        }

        let injectors: Vec<Arc<dyn StaticInjector>> = self.inner.static_injectors.read().clone();

        #[cfg(feature = "tracing")]
        debug!("Running {} static injector(s)", injectors.len());

        for injector in injectors {
            injector.inject_statics(self, injector.implementation(), statics)?;
        }
        Ok(())
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.find_registration(key).is_some()
    }

    /// Finds the registration for `key` and the container that owns it.
    fn find_registration(&self, key: &ComponentKey) -> Option<(DefaultContainer, Arc<Registration>)> {
        let mut current = self.clone();
        loop {
            let found = current.inner.registrations.read().get(key).cloned();
            if let Some(registration) = found {
                return Some((current, registration));
            }
            let parent = current.inner.parent.clone()?;
            current = DefaultContainer { inner: parent };
        }
    }
}

impl Container for DefaultContainer {
    fn component(&self, key: &ComponentKey, into: Option<&TypeKey>) -> Result<Option<Component>, Error> {
        let Some((owner, registration)) = self.find_registration(key) else {
            return Ok(None);
        };

        if let Some(instance) = owner.inner.instances.read().get(key).cloned() {
            return Ok(Some(instance));
        }

        let _guard = RecursionGuard::enter(registration.guard, owner.id(), &key.to_string())?;

        let built = registration.adapter.produce_component(&owner, into)?;

        if !registration.adapter.scope().is_singleton() {
            return Ok(Some(built));
        }

        // Another thread may have finished first; keep the first instance stored.
        let mut instances = owner.inner.instances.write();
        Ok(Some(instances.entry(key.clone()).or_insert(built).clone()))
    }

    fn id(&self) -> ContainerId {
        ContainerId::from_ptr(&*self.inner)
    }
}
