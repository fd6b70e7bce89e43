//! Injection targets: the pre-selected methods an injector invokes.
//!
//! An [`InjectionTarget`] pairs an immutable descriptor (owning type, method
//! name, formal parameters, static flag) with the capability to call the
//! method once its arguments are resolved. Targets are built once, handed to
//! a [`MethodInjector`](crate::injector::MethodInjector) and never mutated.
//!
//! # Examples
//!
//! ```
//! use minject::target::{InjectionTarget, ParamSpec};
//!
//! #[derive(Default)]
//! struct Greeter {
//!     name: String,
//! }
//!
//! let target = InjectionTarget::<Greeter>::instance(
//!     "set_name",
//!     vec![ParamSpec::of::<String>()],
//!     |greeter, args| {
//!         greeter.name = args.get::<String>(0)?.as_ref().clone();
//!         Ok(())
//!     },
//! );
//! assert!(!target.is_static());
//! assert!(target.id().to_string().ends_with("Greeter.set_name"));
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, Error};
use crate::key::TypeKey;

/// A resolved component value.
pub type Component = Arc<dyn Any + Send + Sync>;

type InstanceCall<T> = Box<dyn Fn(&mut T, &Arguments) -> Result<(), BoxError> + Send + Sync>;
type StaticCall = Box<dyn Fn(&Arguments) -> Result<(), BoxError> + Send + Sync>;

/// Identity of an injection target: owning type and method name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetId {
    owner: TypeKey,
    method: &'static str,
}

impl TargetId {
    pub fn new(owner: TypeKey, method: &'static str) -> Self {
        Self { owner, method }
    }

    pub fn owner(&self) -> &TypeKey {
        &self.owner
    }

    pub fn method(&self) -> &'static str {
        self.method
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.method)
    }
}

/// Formal parameter of an injection target.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    ty: TypeKey,
    name: Option<&'static str>,
    qualifier: Option<String>,
    into: bool,
}

impl ParamSpec {
    /// A parameter receiving a component of type `A`.
    pub fn of<A: Any + Send + Sync>() -> Self {
        Self {
            ty: TypeKey::of::<A>(),
            name: None,
            qualifier: None,
            into: false,
        }
    }

    /// Placeholder receiving the [`TypeKey`] of the type being injected into.
    pub fn into_type() -> Self {
        Self {
            into: true,
            ..Self::of::<TypeKey>()
        }
    }

    /// Parameter name, matched against named components when `use_names` is set.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Qualifier used by [`QualifierPolicy`](crate::policy::QualifierPolicy)
    /// to substitute the lookup key.
    pub fn qualified(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn ty(&self) -> &TypeKey {
        &self.ty
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn is_into(&self) -> bool {
        self.into
    }
}

/// Arguments resolved for one invocation, in declaration order.
#[derive(Clone, Default)]
pub struct Arguments {
    values: Vec<Component>,
}

impl Arguments {
    pub fn new(values: Vec<Component>) -> Self {
        Self { values }
    }

    /// Returns the argument at `index` downcast to `A`.
    pub fn get<A: Any + Send + Sync>(&self, index: usize) -> Result<Arc<A>, Error> {
        let value = self.values.get(index).cloned().ok_or_else(|| {
            Error::invalid_configuration(format!(
                "No argument at position {} ({} resolved)",
                index,
                self.values.len()
            ))
        })?;

        value
            .downcast::<A>()
            .map_err(|_| Error::type_mismatch(std::any::type_name::<A>(), &format!("argument {}", index)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments").field("len", &self.values.len()).finish()
    }
}

enum Call<T> {
    Instance(InstanceCall<T>),
    Static(StaticCall),
}

/// One selected injection method.
pub struct InjectionTarget<T> {
    id: TargetId,
    params: Vec<ParamSpec>,
    call: Call<T>,
}

impl<T: 'static> InjectionTarget<T> {
    /// An instance method of `T`, invoked on each freshly built component.
    pub fn instance<F>(method: &'static str, params: Vec<ParamSpec>, call: F) -> Self
    where
        F: Fn(&mut T, &Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            id: TargetId::new(TypeKey::of::<T>(), method),
            params,
            call: Call::Instance(Box::new(call)),
        }
    }

    /// A static method owned by `O`, invoked at most once per statics registry.
    pub fn static_on<O: ?Sized + Any, F>(method: &'static str, params: Vec<ParamSpec>, call: F) -> Self
    where
        F: Fn(&Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            id: TargetId::new(TypeKey::of::<O>(), method),
            params,
            call: Call::Static(Box::new(call)),
        }
    }
}

impl<T> InjectionTarget<T> {
    pub fn id(&self) -> &TargetId {
        &self.id
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn is_static(&self) -> bool {
        matches!(self.call, Call::Static(_))
    }

    /// Calls the method. Static targets take no instance, instance targets require one.
    pub(crate) fn invoke(&self, instance: Option<&mut T>, args: &Arguments) -> Result<(), BoxError> {
        match (&self.call, instance) {
            (Call::Instance(call), Some(instance)) => call(instance, args),
            (Call::Static(call), None) => call(args),
            (call, _) => {
                let is_static = matches!(call, Call::Static(_));
                Err(Box::new(Error::mode_mismatch(&[self.id.to_string()], is_static)))
            }
        }
    }
}

impl<T> fmt::Debug for InjectionTarget<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionTarget")
            .field("id", &self.id.to_string())
            .field("params", &self.params.len())
            .field("static", &self.is_static())
            .finish()
    }
}
