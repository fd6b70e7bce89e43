//! Type and component identities.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a Rust type, with its name kept for diagnostics.
///
/// Equality and hashing only look at the `TypeId`.
#[derive(Clone, Copy, Debug)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Key under which a component is registered in a container.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKey {
    Type(TypeKey),
    Named(String),
}

impl ComponentKey {
    pub fn of<T: ?Sized + Any>() -> Self {
        ComponentKey::Type(TypeKey::of::<T>())
    }

    pub fn named(name: impl Into<String>) -> Self {
        ComponentKey::Named(name.into())
    }
}

impl From<TypeKey> for ComponentKey {
    fn from(key: TypeKey) -> Self {
        ComponentKey::Type(key)
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKey::Type(key) => write!(f, "{}", key),
            ComponentKey::Named(name) => write!(f, "\"{}\"", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Alpha;
    struct Beta;

    #[test]
    fn type_keys_compare_by_type() {
        assert_eq!(TypeKey::of::<Alpha>(), TypeKey::of::<Alpha>());
        assert_ne!(TypeKey::of::<Alpha>(), TypeKey::of::<Beta>());
        assert!(TypeKey::of::<Alpha>().name().ends_with("Alpha"));
    }

    #[test]
    fn component_key_display() {
        assert!(ComponentKey::of::<Beta>().to_string().ends_with("Beta"));
        assert_eq!(ComponentKey::named("db").to_string(), "\"db\"");
        assert_ne!(ComponentKey::named("db"), ComponentKey::named("cache"));
    }
}
