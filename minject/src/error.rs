//! Error types for the method injector.
//!
//! This module defines the error model shared by the injector, the recursion
//! guard, the statics registry and the container.
//!
//! # Design
//!
//! - `ErrorKind` captures the error category.
//! - `Error` stores the category, a human-readable message, the identities
//!   implicated in the failure and, for failed injection methods, the source error.
//!
//! The helpers in `Error` are provided to keep call sites concise and to
//! maintain consistent error messages.
//!
//! # Feature Flags
//!
//! - `tracing`: logs errors when they are created.
//!
//! # Examples
//!
//! ```
//! use minject::error::{Error, ErrorKind};
//!
//! let err = Error::cyclic_dependency(&["A", "B", "A"]);
//! assert_eq!(err.kind, ErrorKind::CyclicDependency);
//! assert!(err.message.contains("A -> B -> A"));
//! ```

use core::fmt;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::error;

/// Error raised by an injection method body.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error categories.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    /// Static-only operation on an instance injector, or the reverse.
    ModeMismatch,
    /// Re-entrant build of the same injector on the same thread and container.
    CyclicDependency,
    /// The injection method itself failed.
    InvocationFailure,
    /// No value could be found for a required argument.
    ResolutionFailure,
    /// A resolved value does not have the expected type.
    TypeMismatch,
    /// Static and instance targets were mixed in one injector.
    MixedInjectionModes,
    /// The injector was configured inconsistently.
    InvalidConfiguration,
    /// A component is already registered under this key.
    ComponentAlreadyRegistered,
}

/// Injector error structure.
///
/// `kind` enables programmatic handling, while `message` is human-readable.
/// `implicated` lists the targets or keys involved: the offending targets for
/// a mode mismatch, the build chain for a cyclic dependency.
#[derive(Clone, Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub implicated: Vec<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    /// Creates a new error with the given kind and message.
    ///
    /// If the `tracing` feature is enabled, the error is automatically logged.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::with_implicated(kind, message, Vec::new())
    }

    fn with_implicated(kind: ErrorKind, message: impl Into<String>, implicated: Vec<String>) -> Self {
        let error = Self {
            kind,
            message: message.into(),
            implicated,
            source: None,
        };

        #[cfg(feature = "tracing")]
        error!("{}", error);

        error
    }

    /// The operation does not match the injector's derived mode.
    ///
    /// `targets` names the injection targets of the offending injector.
    pub fn mode_mismatch(targets: &[String], is_static: bool) -> Self {
        let message = if is_static {
            format!(
                "[{}] are static methods, produce() should not be called on this injector",
                targets.join(", ")
            )
        } else {
            format!(
                "[{}] are instance methods, inject_statics() should not be called on this injector",
                targets.join(", ")
            )
        };
        Self::with_implicated(ErrorKind::ModeMismatch, message, targets.to_vec())
    }

    /// Cyclic dependency detected in the build chain.
    pub fn cyclic_dependency(chain: &[&str]) -> Self {
        Self::with_implicated(
            ErrorKind::CyclicDependency,
            format!("Cyclic dependency detected: {}", chain.join(" -> ")),
            chain.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// An injection method returned an error.
    pub fn invocation_failure(target: &str, source: BoxError) -> Self {
        let mut error = Self::with_implicated(
            ErrorKind::InvocationFailure,
            format!("Injection method {} failed: {}", target, source),
            vec![target.to_string()],
        );
        error.source = Some(Arc::from(source));
        error
    }

    /// No parameter strategy produced a value for an argument.
    pub fn unsatisfied_parameter(target: &str, index: usize, type_name: &str) -> Self {
        Self::with_implicated(
            ErrorKind::ResolutionFailure,
            format!(
                "Unsatisfied parameter {} ({}) of injection method {}",
                index, type_name, target
            ),
            vec![target.to_string()],
        )
    }

    /// No component registered for the requested key.
    pub fn component_not_found(key: &str) -> Self {
        Self::with_implicated(
            ErrorKind::ResolutionFailure,
            format!("No component registered for key: {}", key),
            vec![key.to_string()],
        )
    }

    /// Type mismatch during downcast of a resolved component.
    pub fn type_mismatch(expected: &str, context: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("Type mismatch: expected {} for {}", expected, context),
        )
    }

    /// Static and instance targets were given to the same injector.
    pub fn mixed_injection_modes(statics: &[String], instances: &[String]) -> Self {
        let mut implicated = statics.to_vec();
        implicated.extend_from_slice(instances);
        Self::with_implicated(
            ErrorKind::MixedInjectionModes,
            format!(
                "Cannot mix static targets [{}] with instance targets [{}]",
                statics.join(", "),
                instances.join(", ")
            ),
            implicated,
        )
    }

    /// The injector configuration is inconsistent.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfiguration, message)
    }

    /// A component is already registered for this key.
    pub fn component_already_registered(key: &str) -> Self {
        Self::with_implicated(
            ErrorKind::ComponentAlreadyRegistered,
            format!("Component already registered for key: {}", key),
            vec![key.to_string()],
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}) - {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn mode_mismatch_error() {
        let targets = vec!["A.init".to_string(), "A.setup".to_string()];
        let err = Error::mode_mismatch(&targets, true);
        assert_eq!(err.kind, ErrorKind::ModeMismatch);
        assert!(err.message.contains("A.init, A.setup"));
        assert!(err.message.contains("static"));
        assert_eq!(err.implicated, targets);
    }

    #[test]
    fn cyclic_dependency_error() {
        let err = Error::cyclic_dependency(&["A", "B", "A"]);
        assert_eq!(err.kind, ErrorKind::CyclicDependency);
        assert!(err.message.contains("A -> B -> A"));
        assert_eq!(err.implicated, vec!["A", "B", "A"]);
    }

    #[test]
    fn invocation_failure_keeps_source() {
        let source: BoxError = "disk on fire".into();
        let err = Error::invocation_failure("Db.connect", source);
        assert_eq!(err.kind, ErrorKind::InvocationFailure);
        assert!(err.message.contains("Db.connect"));
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("disk on fire"));

        let cloned = err.clone();
        assert!(cloned.source().is_some());
    }

    #[test]
    fn unsatisfied_parameter_error() {
        let err = Error::unsatisfied_parameter("B.configure", 0, "C");
        assert_eq!(err.kind, ErrorKind::ResolutionFailure);
        assert!(err.message.contains("B.configure"));
        assert!(err.message.contains("(C)"));
    }

    #[test]
    fn mixed_injection_modes_error() {
        let err = Error::mixed_injection_modes(&["A.init".into()], &["B.set".into()]);
        assert_eq!(err.kind, ErrorKind::MixedInjectionModes);
        assert_eq!(err.implicated.len(), 2);
    }

    #[test]
    fn display_trait() {
        let err = Error::component_not_found("X");
        let s = format!("{}", err);
        assert!(s.contains("ResolutionFailure"));
        assert!(s.contains("X"));
    }

    #[test]
    fn error_kind_equality() {
        let err1 = Error::component_already_registered("A");
        let err2 = Error::component_already_registered("B");
        assert_eq!(err1.kind, err2.kind);
        assert_ne!(err1.message, err2.message);
    }
}
