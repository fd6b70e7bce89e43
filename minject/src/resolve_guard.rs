//! Thread-local guard for cyclic dependency detection.
//!
//! This module provides [`RecursionGuard`], which tracks the builds in progress
//! on the current thread. Each frame records who is building (a [`GuardId`],
//! owned by an injector or a container registration) and in which container.
//! Entering again with the same owner and the same container means the build
//! chain looped back on itself, and a detailed error chain is returned instead
//! of recursing until the stack overflows. Entering with a different container
//! is a nested build and is allowed.
//!
//! The guard state for a thread exists only while a build is running: each
//! guard removes its own frame when dropped, whether the build succeeded,
//! returned an error or panicked.
//!
//! # Example
//! ```
//! use minject::container::ContainerId;
//! use minject::error::ErrorKind;
//! use minject::resolve_guard::{GuardId, RecursionGuard};
//!
//! let (a, b) = (GuardId::next(), GuardId::next());
//! let container = ContainerId::from_ptr(&0u8);
//!
//! let _g1 = RecursionGuard::enter(a, container, "A").unwrap();
//! let _g2 = RecursionGuard::enter(b, container, "B").unwrap();
//! let err = RecursionGuard::enter(a, container, "A").unwrap_err();
//! assert_eq!(err.kind, ErrorKind::CyclicDependency);
//! assert!(err.message.contains("A -> B -> A"));
//! ```

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::container::ContainerId;
use crate::error::Error;

#[cfg(feature = "tracing")]
use tracing::trace;

static NEXT_GUARD_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    // Builds in progress on this thread, outermost first.
    static BUILD_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Identity of something that can be re-entered: an injector or a registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GuardId(u64);

impl GuardId {
    pub fn next() -> Self {
        GuardId(NEXT_GUARD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

struct Frame {
    id: u64,
    owner: GuardId,
    container: ContainerId,
    label: String,
}

/// Marks a build as in progress until dropped.
///
/// The guard is tied to the thread that created it.
#[derive(Debug)]
pub struct RecursionGuard {
    owner: GuardId,
    frame: u64,
    _thread_bound: PhantomData<*const ()>,
}

impl RecursionGuard {
    /// Marks `owner` as building in `container` on this thread.
    ///
    /// Returns `Err(Error::cyclic_dependency(..))` if `owner` is already building
    /// in the same container. The chain starts at the first frame of the cycle.
    pub fn enter(owner: GuardId, container: ContainerId, label: &str) -> Result<Self, Error> {
        BUILD_STACK.with(|stack| {
            let mut frames = stack.borrow_mut();

            if let Some(start) = frames
                .iter()
                .position(|f| f.owner == owner && f.container == container)
            {
                let mut chain: Vec<&str> = Vec::with_capacity(frames.len() - start + 1);
                for entry in frames[start..].iter().map(|f| f.label.as_str()).chain([label]) {
                    if chain.last() != Some(&entry) {
                        chain.push(entry);
                    }
                }
                return Err(Error::cyclic_dependency(&chain));
            }

            let frame = NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed);
            frames.push(Frame {
                id: frame,
                owner,
                container,
                label: label.to_string(),
            });

            #[cfg(feature = "tracing")]
            trace!("Entered build of {} at depth {}", label, frames.len() - 1);

            Ok(RecursionGuard {
                owner,
                frame,
                _thread_bound: PhantomData,
            })
        })
    }

    /// Whether `owner` is currently building in `container` on this thread.
    pub fn is_in_progress(owner: GuardId, container: ContainerId) -> bool {
        BUILD_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .any(|f| f.owner == owner && f.container == container)
        })
    }

    /// Number of builds in progress on this thread.
    pub fn depth() -> usize {
        BUILD_STACK.with(|stack| stack.borrow().len())
    }

    pub fn owner(&self) -> GuardId {
        self.owner
    }
}

impl Drop for RecursionGuard {
    fn drop(&mut self) {
        // Remove only our own frame; guards may be dropped out of order.
        let _ = BUILD_STACK.try_with(|stack| {
            let mut frames = stack.borrow_mut();
            if let Some(position) = frames.iter().rposition(|f| f.id == self.frame) {
                frames.remove(position);
            }
        });
    }
}
