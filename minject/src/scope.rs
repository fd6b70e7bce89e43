use std::fmt;

/// How long a built component lives in its container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scope {
    /// Built once per owning container, then cached.
    Singleton,
    /// Built on every request.
    #[default]
    Transient,
}

impl Scope {
    pub fn is_singleton(self) -> bool {
        matches!(self, Scope::Singleton)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Singleton => f.write_str("singleton"),
            Scope::Transient => f.write_str("transient"),
        }
    }
}
