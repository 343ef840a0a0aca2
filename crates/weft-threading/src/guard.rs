//! Deferred-action guards: run cleanup when the last owner lets go.
//!
//! Two flavors are provided:
//!
//! - [`ScopeGuard`]: move-only, single owner. The action runs when the
//!   guard is dropped, unless it was [`dismiss`](ScopeGuard::dismiss)ed.
//! - [`SharedGuard`]: reference counted. Clones share one action; the
//!   action runs exactly once, when the last clone is dropped or reset.
//!   Handles may be cloned, handed to other threads, and dropped in any
//!   interleaving without risking a double fire or a missed fire.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicI32, Ordering};
//!
//! use weft_threading::SharedGuard;
//!
//! let counter = Arc::new(AtomicI32::new(9));
//!
//! let counter_clone = counter.clone();
//! let outer;
//! {
//!     let inner = SharedGuard::new(move || {
//!         counter_clone.fetch_add(1, Ordering::SeqCst);
//!     });
//!     outer = inner.clone();
//!     // `inner` drops here, but `outer` still owns the action.
//! }
//! assert_eq!(counter.load(Ordering::SeqCst), 9);
//!
//! drop(outer);
//! assert_eq!(counter.load(Ordering::SeqCst), 10);
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

/// A boxed cleanup action.
type Action = Box<dyn FnOnce() + Send + 'static>;

/// An action paired with an at-most-once fired flag.
///
/// The surrounding `Arc` carries the shared reference count; the flag's
/// compare-and-set is the single transition that admits a fire.
struct DeferredAction {
    fired: AtomicBool,
    action: Mutex<Option<Action>>,
}

impl DeferredAction {
    fn new(action: Action) -> Self {
        Self {
            fired: AtomicBool::new(false),
            action: Mutex::new(Some(action)),
        }
    }

    fn fire(&self) {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let action = self.action.lock().take();
            if let Some(action) = action {
                action();
            }
        }
    }
}

impl Drop for DeferredAction {
    fn drop(&mut self) {
        self.fire();
    }
}

/// A reference-counted handle to a deferred action.
///
/// The action fires exactly once, precisely when the last handle referencing
/// it disappears, and never while any handle is still alive. A
/// default-constructed guard is empty and owns nothing.
///
/// Assigning over a guard (`*slot = other.clone()`) releases whatever the
/// slot held before; if that was the last reference to a different action,
/// the displaced action fires as part of the assignment.
pub struct SharedGuard {
    inner: Option<Arc<DeferredAction>>,
}

impl SharedGuard {
    /// Create a guard owning `action`, with a reference count of one.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            inner: Some(Arc::new(DeferredAction::new(Box::new(action)))),
        }
    }

    /// Whether this guard still references an unfired action.
    pub fn is_armed(&self) -> bool {
        match &self.inner {
            Some(inner) => !inner.fired.load(Ordering::Acquire),
            None => false,
        }
    }

    /// Number of guards currently sharing this action (zero if empty).
    pub fn owner_count(&self) -> usize {
        self.inner.as_ref().map(Arc::strong_count).unwrap_or(0)
    }

    /// Release this guard's reference, leaving it empty.
    ///
    /// If this was the last reference, the action fires before `reset`
    /// returns. Other owners are unaffected.
    pub fn reset(&mut self) {
        self.inner = None;
    }
}

impl Default for SharedGuard {
    /// An empty guard: no action, no ownership.
    fn default() -> Self {
        Self { inner: None }
    }
}

impl Clone for SharedGuard {
    /// Share the action, incrementing its reference count.
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl fmt::Debug for SharedGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedGuard")
            .field("armed", &self.is_armed())
            .field("owners", &self.owner_count())
            .finish()
    }
}

/// A move-only scope-exit guard.
///
/// The action runs when the guard is dropped. Moving the guard transfers
/// ownership without firing; [`dismiss`](ScopeGuard::dismiss) consumes the
/// guard without ever firing.
///
/// # Example
///
/// ```
/// use weft_threading::ScopeGuard;
///
/// let mut restored = false;
/// {
///     let _guard = ScopeGuard::new(|| restored = true);
///     // ... work that must be undone on every exit path ...
/// }
/// assert!(restored);
/// ```
pub struct ScopeGuard<F: FnOnce()> {
    action: Option<F>,
}

impl<F: FnOnce()> ScopeGuard<F> {
    /// Create a guard that runs `action` on drop.
    pub fn new(action: F) -> Self {
        Self {
            action: Some(action),
        }
    }

    /// Consume the guard without running the action.
    pub fn dismiss(mut self) {
        self.action = None;
    }
}

impl<F: FnOnce()> Drop for ScopeGuard<F> {
    fn drop(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

impl<F: FnOnce()> fmt::Debug for ScopeGuard<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("armed", &self.action.is_some())
            .finish()
    }
}

static_assertions::assert_impl_all!(SharedGuard: Send, Sync);
