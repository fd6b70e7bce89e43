//! Registry of static injection targets that have already run.
//!
//! A [`StaticsRegistry`] is shared by every injector taking part in the same
//! static injection pass, usually behind an `Arc`. Entries are only ever added:
//! to start over, callers drop the registry and create a new one.
//!
//! Static methods of one owning type are serialized by a reentrant lock from
//! [`owner_lock`]. The lock table is process wide, so the methods of a type
//! never run concurrently even when callers use different registries. The
//! injector holds that lock across "check registry, invoke, mark registry" so
//! that a static method runs at most once however many threads race on it.
//!
//! # Examples
//!
//! ```
//! use minject::key::TypeKey;
//! use minject::statics::StaticsRegistry;
//! use minject::target::TargetId;
//!
//! struct Settings;
//!
//! let registry = StaticsRegistry::new();
//! let target = TargetId::new(TypeKey::of::<Settings>(), "load");
//!
//! assert!(!registry.is_already_initialized(&target));
//! registry.mark_initialized(target.clone());
//! assert!(registry.is_already_initialized(&target));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use parking_lot::{Mutex, ReentrantMutex, RwLock};

use crate::key::TypeKey;
use crate::target::TargetId;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Lock serializing static injection for one owning type.
pub type OwnerLock = Arc<ReentrantMutex<()>>;

static OWNER_LOCKS: LazyLock<Mutex<HashMap<TypeKey, OwnerLock>>> = LazyLock::new(|| Mutex::new(HashMap::new()));

/// The lock for `owner`, created on first use.
///
/// Every caller in the process asking for the same owner gets the same lock.
pub fn owner_lock(owner: &TypeKey) -> OwnerLock {
    OWNER_LOCKS
        .lock()
        .entry(*owner)
        .or_insert_with(|| Arc::new(ReentrantMutex::new(())))
        .clone()
}

/// Set of static injection targets already initialized.
#[derive(Default)]
pub struct StaticsRegistry {
    initialized: RwLock<HashSet<TargetId>>,
    running: Mutex<HashSet<TargetId>>,
}

impl StaticsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_already_initialized(&self, target: &TargetId) -> bool {
        self.initialized.read().contains(target)
    }

    pub fn mark_initialized(&self, target: TargetId) {
        #[cfg(feature = "tracing")]
        debug!("Marking static target {} as initialized", target);

        self.initialized.write().insert(target);
    }

    /// Whether `target` is being invoked right now.
    pub fn is_running(&self, target: &TargetId) -> bool {
        self.running.lock().contains(target)
    }

    /// Records `target` as running until the returned token is dropped.
    ///
    /// Returns `None` if it is already running. Callers hold the owner lock,
    /// so only the thread already invoking `target` can observe that.
    pub(crate) fn start(&self, target: &TargetId) -> Option<Running<'_>> {
        if !self.running.lock().insert(target.clone()) {
            return None;
        }
        Some(Running {
            registry: self,
            target: target.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.initialized.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.initialized.read().is_empty()
    }

    /// Snapshot of the initialized targets, sorted by their display form.
    pub fn initialized(&self) -> Vec<TargetId> {
        let mut targets: Vec<TargetId> = self.initialized.read().iter().cloned().collect();
        targets.sort_by_key(|t| t.to_string());
        targets
    }
}

impl std::fmt::Debug for StaticsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticsRegistry")
            .field("initialized", &self.len())
            .field("running", &self.running.lock().len())
            .finish()
    }
}

/// A static invocation in progress; cleared on drop, including unwinding.
pub(crate) struct Running<'a> {
    registry: &'a StaticsRegistry,
    target: TargetId,
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.registry.running.lock().remove(&self.target);
    }
}
