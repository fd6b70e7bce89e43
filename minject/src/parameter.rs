//! Parameter resolution strategies.
//!
//! A [`Parameter`] decides where the value for one argument of an injection
//! target comes from. The injector asks one strategy per argument position:
//! either an explicit override from [`MethodParameters`], one substituted by
//! the [`InjectionPolicy`](crate::policy::InjectionPolicy), or the policy's
//! default strategy.
//!
//! Returning `Ok(None)` means "no satisfying value"; the injector turns that
//! into a resolution failure. `Err` is reserved for real failures raised while
//! looking the value up, such as a cycle found while building a dependency.

use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::error::Error;
use crate::key::{ComponentKey, TypeKey};
use crate::target::{Component, ParamSpec, TargetId};

/// Everything a strategy may consult while resolving one argument.
pub struct ResolutionContext<'a> {
    pub container: &'a dyn Container,
    pub into: Option<&'a TypeKey>,
    pub use_names: bool,
    pub target: &'a TargetId,
}

/// Strategy producing the value of one argument.
pub trait Parameter: Send + Sync + fmt::Debug {
    fn resolve(&self, ctx: &ResolutionContext<'_>, formal: &ParamSpec) -> Result<Option<Component>, Error>;
}

/// Default strategy: resolve from the container.
///
/// An "into" placeholder receives the type being injected into. Otherwise the
/// parameter name is tried first when `use_names` is set, then the type.
#[derive(Clone, Copy, Debug, Default)]
pub struct ComponentParameter;

impl Parameter for ComponentParameter {
    fn resolve(&self, ctx: &ResolutionContext<'_>, formal: &ParamSpec) -> Result<Option<Component>, Error> {
        if formal.is_into() {
            return Ok(ctx.into.map(|into| Arc::new(*into) as Component));
        }

        if ctx.use_names {
            if let Some(name) = formal.name() {
                if let Some(found) = ctx.container.component(&ComponentKey::named(name), ctx.into)? {
                    return Ok(Some(found));
                }
            }
        }

        ctx.container.component(&ComponentKey::Type(*formal.ty()), ctx.into)
    }
}

/// Resolves the argument from an explicit key.
#[derive(Clone, Debug)]
pub struct KeyedParameter {
    key: ComponentKey,
}

impl KeyedParameter {
    pub fn new(key: ComponentKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &ComponentKey {
        &self.key
    }
}

impl Parameter for KeyedParameter {
    fn resolve(&self, ctx: &ResolutionContext<'_>, _formal: &ParamSpec) -> Result<Option<Component>, Error> {
        ctx.container.component(&self.key, ctx.into)
    }
}

/// Always passes the same value.
#[derive(Clone)]
pub struct ConstantParameter {
    value: Component,
    type_name: &'static str,
}

impl ConstantParameter {
    pub fn new<A: std::any::Any + Send + Sync>(value: A) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<A>(),
        }
    }
}

impl fmt::Debug for ConstantParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConstantParameter").field(&self.type_name).finish()
    }
}

impl Parameter for ConstantParameter {
    fn resolve(&self, _ctx: &ResolutionContext<'_>, _formal: &ParamSpec) -> Result<Option<Component>, Error> {
        Ok(Some(self.value.clone()))
    }
}

/// Explicit parameter overrides for one injection method.
///
/// Positions are matched in order. A shorter list than the method's arity is
/// only accepted when the injector does not use all parameters; the remaining
/// positions then fall back to the default strategy.
#[derive(Clone, Debug)]
pub struct MethodParameters {
    method: &'static str,
    owner: Option<TypeKey>,
    params: Vec<Arc<dyn Parameter>>,
}

impl MethodParameters {
    pub fn new(method: &'static str, params: Vec<Arc<dyn Parameter>>) -> Self {
        Self {
            method,
            owner: None,
            params,
        }
    }

    /// Restricts the overrides to the method of that name on `O`.
    pub fn on<O: ?Sized + std::any::Any>(mut self) -> Self {
        self.owner = Some(TypeKey::of::<O>());
        self
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn params(&self) -> &[Arc<dyn Parameter>] {
        &self.params
    }

    pub fn matches(&self, target: &TargetId) -> bool {
        self.method == target.method() && self.owner.is_none_or(|owner| &owner == target.owner())
    }
}
