//! Method injection.
//!
//! A [`MethodInjector`] owns a fixed, ordered list of [`InjectionTarget`]s and
//! runs them in one of two modes, derived once from the targets:
//!
//! - **instance mode** ([`produce`](MethodInjector::produce)): build a fresh
//!   component, then call every target on it with arguments resolved from the
//!   container;
//! - **static mode** ([`inject_statics`](MethodInjector::inject_statics)): call
//!   every target at most once for the lifetime of a [`StaticsRegistry`], no
//!   matter how many threads ask concurrently.
//!
//! Both paths run under the [`RecursionGuard`], so a dependency graph that loops
//! back to this injector on the same thread and container fails with a cyclic
//! dependency error instead of recursing forever.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use minject::container::DefaultContainer;
//! use minject::injector::MethodInjector;
//! use minject::key::ComponentKey;
//! use minject::provider::Provider;
//! use minject::target::{InjectionTarget, ParamSpec};
//!
//! struct Clock {
//!     tz: &'static str,
//! }
//!
//! #[derive(Default)]
//! struct Scheduler {
//!     clock: Option<Arc<Clock>>,
//! }
//!
//! let container = DefaultContainer::root();
//! container.register(Provider::instance(Clock { tz: "UTC" })).unwrap();
//!
//! let injector = MethodInjector::builder(ComponentKey::of::<Scheduler>())
//!     .constructor(|_| Ok(Scheduler::default()))
//!     .target(InjectionTarget::instance(
//!         "set_clock",
//!         vec![ParamSpec::of::<Clock>()],
//!         |scheduler: &mut Scheduler, args| {
//!             scheduler.clock = Some(args.get::<Clock>(0)?);
//!             Ok(())
//!         },
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let scheduler = injector.produce(&container, None).unwrap();
//! assert_eq!(scheduler.clock.unwrap().tz, "UTC");
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use crate::container::{ComponentAdapter, Container, StaticInjector};
use crate::error::Error;
use crate::key::{ComponentKey, TypeKey};
use crate::monitor::{Monitor, NullMonitor};
use crate::parameter::{MethodParameters, ResolutionContext};
use crate::policy::{InjectionPolicy, Member, ParameterSlots, QualifierPolicy};
use crate::resolve_guard::{GuardId, RecursionGuard};
use crate::scope::Scope;
use crate::statics::{StaticsRegistry, owner_lock};
use crate::target::{Arguments, Component, InjectionTarget};

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

type Constructor<T> = Box<dyn Fn(&dyn Container) -> Result<T, Error> + Send + Sync>;

/// Settings fixed when the injector is built.
#[derive(Clone)]
pub struct InjectorConfiguration {
    pub key: ComponentKey,
    pub implementation: TypeKey,
    pub monitor: Arc<dyn Monitor>,
    pub parameters: Vec<MethodParameters>,
    /// Try parameter names before types when resolving from the container.
    pub use_names: bool,
    /// Explicit overrides must cover every parameter of their method.
    pub use_all_parameters: bool,
    pub scope: Scope,
}

impl fmt::Debug for InjectorConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectorConfiguration")
            .field("key", &self.key)
            .field("implementation", &self.implementation)
            .field("parameters", &self.parameters)
            .field("use_names", &self.use_names)
            .field("use_all_parameters", &self.use_all_parameters)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Injects dependencies through a fixed list of methods.
pub struct MethodInjector<T> {
    config: InjectorConfiguration,
    targets: Vec<InjectionTarget<T>>,
    is_static: bool,
    guard: GuardId,
    constructor: Option<Constructor<T>>,
    policy: Arc<dyn InjectionPolicy>,
}

impl<T: 'static> MethodInjector<T> {
    /// Instance injector with the default settings: names are used, overrides
    /// must cover all parameters, invocations are not monitored.
    pub fn new<F>(key: ComponentKey, constructor: F, targets: Vec<InjectionTarget<T>>) -> Result<Self, Error>
    where
        F: Fn(&dyn Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        Self::builder(key).constructor(constructor).targets(targets).build()
    }

    /// Starts configuring an injector for components of type `T`.
    ///
    /// Static targets do not mention `T`, so a static-only injector names it
    /// explicitly, usually as the owning type: `MethodInjector::<Settings>::builder(..)`.
    pub fn builder(key: ComponentKey) -> MethodInjectorBuilder<T> {
        MethodInjectorBuilder {
            config: InjectorConfiguration {
                key,
                implementation: TypeKey::of::<T>(),
                monitor: Arc::new(NullMonitor),
                parameters: Vec::new(),
                use_names: true,
                use_all_parameters: true,
                scope: Scope::Transient,
            },
            targets: Vec::new(),
            constructor: None,
            policy: Arc::new(QualifierPolicy),
        }
    }
}

impl<T> MethodInjector<T> {
    pub fn configuration(&self) -> &InjectorConfiguration {
        &self.config
    }

    pub fn targets(&self) -> &[InjectionTarget<T>] {
        &self.targets
    }

    /// True when every target is static; fixed at construction.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Stable identity built from the targets, e.g. `MethodInjector_static_[app::A.init,app::A.setup]-`.
    pub fn descriptor(&self) -> String {
        let methods: Vec<String> = self.targets.iter().map(|t| t.id().to_string()).collect();
        format!(
            "MethodInjector{}[{}]-",
            if self.is_static { "_static_" } else { "" },
            methods.join(",")
        )
    }

    /// Builds a component and calls every target on it, in declaration order.
    ///
    /// Fails with a mode mismatch on a static injector, without calling anything.
    pub fn produce(&self, container: &dyn Container, into: Option<&TypeKey>) -> Result<T, Error> {
        if self.is_static {
            return Err(Error::mode_mismatch(&self.target_names(), true));
        }

        let _guard = RecursionGuard::enter(self.guard, container.id(), &self.config.key.to_string())?;

        #[cfg(feature = "tracing")]
        debug!("Producing {} through {}", self.config.implementation, self.descriptor());

        let constructor = self.constructor.as_ref().ok_or_else(|| {
            Error::invalid_configuration(format!("{} has no constructor", self.descriptor()))
        })?;
        let mut instance = constructor(container)?;

        for target in &self.targets {
            let args = self.resolve_arguments(container, target, into)?;
            self.invoke_instance(target, &mut instance, &args)?;
        }

        Ok(instance)
    }

    /// Calls every static target that `statics` has not seen yet.
    ///
    /// `into` is passed to "into" placeholder parameters. A target that fails
    /// is not marked, so a later call retries it; targets that ran before the
    /// failure stay marked.
    pub fn inject_statics(&self, container: &dyn Container, into: &TypeKey, statics: &StaticsRegistry) -> Result<(), Error> {
        if !self.is_static {
            return Err(Error::mode_mismatch(&self.target_names(), false));
        }

        let _guard = RecursionGuard::enter(self.guard, container.id(), &self.config.key.to_string())?;

        #[cfg(feature = "tracing")]
        debug!("Static injection into {} through {}", into, self.descriptor());

        for target in &self.targets {
            // Cheap pre-check; the authoritative one happens under the owner lock.
            if statics.is_already_initialized(target.id()) {
                self.notify(|m| m.skipped(target.id()));
                continue;
            }

            let args = self.resolve_arguments(container, target, Some(into))?;
            self.invoke_static(target, &args, statics)?;
        }

        Ok(())
    }

    /// Resolves the arguments of `target` against `container`.
    ///
    /// Explicit overrides are padded to the method's arity, passed through the
    /// policy's interception hook, and the remaining gaps are filled with the
    /// policy's default strategy.
    pub fn resolve_arguments(
        &self,
        container: &dyn Container,
        target: &InjectionTarget<T>,
        into: Option<&TypeKey>,
    ) -> Result<Arguments, Error> {
        let member = Member {
            id: target.id(),
            params: target.params(),
        };

        let slots = self.policy.intercept_parameters(self.explicit_parameters(&member), &member);
        if slots.len() != member.params.len() {
            return Err(Error::invalid_configuration(format!(
                "Parameter interception returned {} slot(s) for {} which takes {}",
                slots.len(),
                member.id,
                member.params.len()
            )));
        }

        let ctx = ResolutionContext {
            container,
            into,
            use_names: self.config.use_names,
            target: target.id(),
        };

        let target_name = target.id().to_string();
        let mut values: Vec<Component> = Vec::with_capacity(slots.len());
        for (index, (slot, formal)) in slots.into_iter().zip(member.params).enumerate() {
            let parameter = slot.unwrap_or_else(|| self.policy.default_parameter());
            let value = parameter
                .resolve(&ctx, formal)?
                .ok_or_else(|| Error::unsatisfied_parameter(&target_name, index, formal.ty().name()))?;

            if (*value).type_id() != formal.ty().id() {
                return Err(Error::type_mismatch(
                    formal.ty().name(),
                    &format!("parameter {} of {}", index, target_name),
                ));
            }
            values.push(value);
        }

        Ok(Arguments::new(values))
    }

    fn explicit_parameters(&self, member: &Member<'_>) -> ParameterSlots {
        let mut slots: ParameterSlots = vec![None; member.params.len()];
        if let Some(overrides) = self.config.parameters.iter().find(|p| p.matches(member.id)) {
            for (slot, parameter) in slots.iter_mut().zip(overrides.params()) {
                *slot = Some(parameter.clone());
            }
        }
        slots
    }

    fn invoke_instance(&self, target: &InjectionTarget<T>, instance: &mut T, args: &Arguments) -> Result<(), Error> {
        self.notify(|m| m.invoking(target.id()));
        let started = Instant::now();

        match target.invoke(Some(instance), args) {
            Ok(()) => {
                let elapsed = started.elapsed();
                self.notify(|m| m.invoked(target.id(), elapsed));
                Ok(())
            }
            Err(source) => {
                let error = Error::invocation_failure(&target.id().to_string(), source);
                self.notify(|m| m.invocation_failed(target.id(), &error));
                Err(error)
            }
        }
    }

    /// Check, invoke and mark under the owning type's lock.
    ///
    /// The lock is reentrant, so a static method that leads back to the same
    /// target on this thread finds it running and fails with a cyclic
    /// dependency instead of running it a second time.
    fn invoke_static(&self, target: &InjectionTarget<T>, args: &Arguments, statics: &StaticsRegistry) -> Result<(), Error> {
        let lock = owner_lock(target.id().owner());

        let outcome = {
            let _held = lock.lock();
            if statics.is_already_initialized(target.id()) {
                None
            } else {
                let name = target.id().to_string();
                let _running = statics
                    .start(target.id())
                    .ok_or_else(|| Error::cyclic_dependency(&[name.as_str(), name.as_str()]))?;

                self.notify(|m| m.invoking(target.id()));
                let started = Instant::now();
                let result = target.invoke(None, args);
                if result.is_ok() {
                    statics.mark_initialized(target.id().clone());
                }
                Some((result, started.elapsed()))
            }
        };

        match outcome {
            None => {
                #[cfg(feature = "tracing")]
                debug!("Static target {} already initialized by another caller", target.id());

                self.notify(|m| m.skipped(target.id()));
                Ok(())
            }
            Some((Ok(()), elapsed)) => {
                #[cfg(feature = "tracing")]
                info!("Static target {} initialized", target.id());

                self.notify(|m| m.invoked(target.id(), elapsed));
                Ok(())
            }
            Some((Err(source), _)) => {
                let error = Error::invocation_failure(&target.id().to_string(), source);
                self.notify(|m| m.invocation_failed(target.id(), &error));
                Err(error)
            }
        }
    }

    fn notify(&self, event: impl FnOnce(&dyn Monitor)) {
        let monitor = &*self.config.monitor;
        if catch_unwind(AssertUnwindSafe(|| event(monitor))).is_err() {
            #[cfg(feature = "tracing")]
            warn!("Monitor of {} panicked; ignoring", self.descriptor());
        }
    }

    fn target_names(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.id().to_string()).collect()
    }
}

impl<T> fmt::Debug for MethodInjector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInjector")
            .field("descriptor", &self.descriptor())
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<T: Any + Send + Sync> ComponentAdapter for MethodInjector<T> {
    fn key(&self) -> &ComponentKey {
        &self.config.key
    }

    fn scope(&self) -> Scope {
        self.config.scope
    }

    fn produce_component(&self, container: &dyn Container, into: Option<&TypeKey>) -> Result<Component, Error> {
        self.produce(container, into).map(|instance| Arc::new(instance) as Component)
    }

    fn descriptor(&self) -> String {
        MethodInjector::descriptor(self)
    }
}

impl<T: Any + Send + Sync> StaticInjector for MethodInjector<T> {
    fn inject_statics(&self, container: &dyn Container, into: &TypeKey, statics: &StaticsRegistry) -> Result<(), Error> {
        MethodInjector::inject_statics(self, container, into, statics)
    }

    fn implementation(&self) -> &TypeKey {
        &self.config.implementation
    }

    fn descriptor(&self) -> String {
        MethodInjector::descriptor(self)
    }
}

/// Collects the configuration of a [`MethodInjector`].
pub struct MethodInjectorBuilder<T> {
    config: InjectorConfiguration,
    targets: Vec<InjectionTarget<T>>,
    constructor: Option<Constructor<T>>,
    policy: Arc<dyn InjectionPolicy>,
}

impl<T: 'static> MethodInjectorBuilder<T> {
    /// How the bare component is built before instance targets run.
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&dyn Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        self.constructor = Some(Box::new(constructor));
        self
    }

    pub fn target(mut self, target: InjectionTarget<T>) -> Self {
        self.targets.push(target);
        self
    }

    pub fn targets(mut self, targets: impl IntoIterator<Item = InjectionTarget<T>>) -> Self {
        self.targets.extend(targets);
        self
    }

    pub fn monitor(mut self, monitor: Arc<dyn Monitor>) -> Self {
        self.config.monitor = monitor;
        self
    }

    pub fn parameters(mut self, parameters: MethodParameters) -> Self {
        self.config.parameters.push(parameters);
        self
    }

    pub fn use_names(mut self, use_names: bool) -> Self {
        self.config.use_names = use_names;
        self
    }

    pub fn use_all_parameters(mut self, use_all_parameters: bool) -> Self {
        self.config.use_all_parameters = use_all_parameters;
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.config.scope = scope;
        self
    }

    pub fn policy(mut self, policy: Arc<dyn InjectionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Validates the configuration and derives the injection mode.
    pub fn build(self) -> Result<MethodInjector<T>, Error> {
        if self.targets.is_empty() {
            return Err(Error::invalid_configuration(format!(
                "No injection targets given for {}",
                self.config.key
            )));
        }

        let (statics, instances): (Vec<&InjectionTarget<T>>, Vec<&InjectionTarget<T>>) =
            self.targets.iter().partition(|t| t.is_static());
        if !statics.is_empty() && !instances.is_empty() {
            let names = |targets: &[&InjectionTarget<T>]| targets.iter().map(|t| t.id().to_string()).collect::<Vec<_>>();
            return Err(Error::mixed_injection_modes(&names(&statics[..]), &names(&instances[..])));
        }
        let is_static = instances.is_empty();

        if !is_static && self.constructor.is_none() {
            return Err(Error::invalid_configuration(format!(
                "Instance injection for {} needs a constructor",
                self.config.key
            )));
        }

        self.validate_parameters()?;

        let injector = MethodInjector {
            config: self.config,
            targets: self.targets,
            is_static,
            guard: GuardId::next(),
            constructor: self.constructor,
            policy: self.policy,
        };

        #[cfg(feature = "tracing")]
        info!("Built {} for {}", injector.descriptor(), injector.config.key);

        Ok(injector)
    }

    fn validate_parameters(&self) -> Result<(), Error> {
        for overrides in &self.config.parameters {
            let target = self
                .targets
                .iter()
                .find(|t| overrides.matches(t.id()))
                .ok_or_else(|| {
                    Error::invalid_configuration(format!(
                        "Parameters given for unknown injection method {}",
                        overrides.method()
                    ))
                })?;

            let (given, arity) = (overrides.params().len(), target.params().len());
            if given > arity || (self.config.use_all_parameters && given != arity) {
                return Err(Error::invalid_configuration(format!(
                    "{} parameter(s) given for {} which takes {}",
                    given,
                    target.id(),
                    arity
                )));
            }
        }
        Ok(())
    }
}
