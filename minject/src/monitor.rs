//! Observer hooks for injection method invocations.
//!
//! Every method has a no-op default, so a monitor only overrides what it cares
//! about. The injector shields itself from monitors: a panic inside a monitor
//! is caught and logged, and success is only reported once the statics
//! registry has been updated.

use std::time::Duration;

use crate::error::Error;
use crate::target::TargetId;

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

pub trait Monitor: Send + Sync {
    /// About to call `target`.
    fn invoking(&self, _target: &TargetId) {}

    /// `target` returned successfully.
    fn invoked(&self, _target: &TargetId, _elapsed: Duration) {}

    /// `target` returned an error.
    fn invocation_failed(&self, _target: &TargetId, _error: &Error) {}

    /// Static `target` was already initialized and was not called.
    fn skipped(&self, _target: &TargetId) {}
}

/// Ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMonitor;

impl Monitor for NullMonitor {}

/// Logs invocations through `tracing`.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingMonitor;

#[cfg(feature = "tracing")]
impl Monitor for TracingMonitor {
    fn invoking(&self, target: &TargetId) {
        debug!("Invoking injection method {}", target);
    }

    fn invoked(&self, target: &TargetId, elapsed: Duration) {
        info!("Injection method {} completed in {:?}", target, elapsed);
    }

    fn invocation_failed(&self, target: &TargetId, error: &Error) {
        warn!("Injection method {} failed: {}", target, error);
    }

    fn skipped(&self, target: &TargetId) {
        debug!("Static injection method {} already initialized, skipping", target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::TypeKey;

    struct Owner;

    #[test]
    fn null_monitor_accepts_every_event() {
        let target = TargetId::new(TypeKey::of::<Owner>(), "init");
        let monitor: &dyn Monitor = &NullMonitor;
        monitor.invoking(&target);
        monitor.invoked(&target, Duration::from_millis(1));
        monitor.invocation_failed(&target, &Error::invalid_configuration("boom"));
        monitor.skipped(&target);
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn tracing_monitor_accepts_every_event() {
        let target = TargetId::new(TypeKey::of::<Owner>(), "init");
        let monitor: &dyn Monitor = &TracingMonitor;
        monitor.invoking(&target);
        monitor.invoked(&target, Duration::ZERO);
        monitor.skipped(&target);
    }
}
