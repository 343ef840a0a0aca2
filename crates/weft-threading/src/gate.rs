//! Single-use blocking handshake between two threads.
//!
//! A [`WaitGate`] is the rendezvous point of a cross-thread dispatch: the
//! calling thread blocks in [`WaitGate::wait`] while the target thread runs
//! the dispatched action and calls [`WaitGate::signal`]. The gate's lock and
//! condition variable also establish the happens-before edge that makes the
//! action's side effects visible to the caller once `wait` returns.
//!
//! Gates are single-use: `completed` transitions `false` → `true` exactly
//! once and never resets.
//!
//! # Example
//!
//! ```
//! use std::thread;
//!
//! use weft_threading::WaitGate;
//!
//! let gate = WaitGate::new();
//! let signaler = gate.clone();
//!
//! let handle = thread::spawn(move || {
//!     // ... produce something ...
//!     signaler.signal();
//! });
//!
//! gate.wait();
//! handle.join().unwrap();
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Shared state behind a gate's clones.
struct GateState {
    completed: Mutex<bool>,
    condvar: Condvar,
}

/// A single-use completion gate.
///
/// Cloning yields another handle to the same gate, so one clone can travel
/// to the signaling thread while the original stays with the waiter.
#[derive(Clone)]
pub struct WaitGate {
    inner: Arc<GateState>,
}

impl WaitGate {
    /// Create a gate in the unsignaled state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(GateState {
                completed: Mutex::new(false),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Mark the gate completed and wake all waiters.
    ///
    /// Calling `signal` more than once is a no-op after the first call.
    pub fn signal(&self) {
        let mut completed = self.inner.completed.lock();
        if *completed {
            return;
        }
        *completed = true;
        self.inner.condvar.notify_all();
    }

    /// Block until the gate is signaled.
    ///
    /// Returns immediately if [`signal`](WaitGate::signal) was already
    /// called; a waiter arriving after the signal cannot miss it.
    pub fn wait(&self) {
        let mut completed = self.inner.completed.lock();
        while !*completed {
            self.inner.condvar.wait(&mut completed);
        }
    }

    /// Block until the gate is signaled or the timeout elapses.
    ///
    /// Returns `true` if the gate was signaled, `false` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut completed = self.inner.completed.lock();
        while !*completed {
            if self
                .inner
                .condvar
                .wait_until(&mut completed, deadline)
                .timed_out()
            {
                return *completed;
            }
        }
        true
    }

    /// Whether the gate has been signaled.
    pub fn is_signaled(&self) -> bool {
        *self.inner.completed.lock()
    }
}

impl Default for WaitGate {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(WaitGate: Send, Sync, Clone);
