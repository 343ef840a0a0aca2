//! Synchronous cross-thread dispatch.
//!
//! [`run_sync`] executes a closure on a target [`ExecutionContext`] and
//! blocks the caller until it has finished. If the caller is already on the
//! target context's thread, the closure runs inline with no queue hop and
//! no blocking; otherwise it is posted to the context's queue and the caller
//! waits on a [`WaitGate`] for completion. Either way, every side effect of
//! the closure is visible to the caller when `run_sync` returns.
//!
//! [`post`] is the fire-and-forget sibling: queue the closure and return
//! immediately.
//!
//! # Example
//!
//! ```
//! use std::thread;
//!
//! use weft_threading::{EventThread, run_sync};
//!
//! let event_thread = EventThread::new();
//! let context = event_thread.context();
//!
//! let caller = thread::current().id();
//! let ran_on = run_sync(&context, || thread::current().id());
//! assert_ne!(ran_on, caller);
//!
//! event_thread.stop_and_join();
//! ```
//!
//! # Deadlock hazard
//!
//! The target context must be actively draining its queue. Dispatching to a
//! stopped context, or forming a cycle (context A blocks dispatching to B
//! while B blocks dispatching to A), blocks the caller forever. This is a
//! precondition on the caller; it is not detected or recovered here, and
//! there is no timeout.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::context::ExecutionContext;
use crate::gate::WaitGate;

/// Run `action` on `context`'s thread and return its result, blocking the
/// caller until the action has completed.
///
/// On the same-context path the action runs inline, re-entrantly: a
/// dispatched action may itself call `run_sync` toward its own context.
///
/// Actions queued to one context run in post order relative to work already
/// queued there; there is no ordering guarantee across different contexts.
///
/// # Panics
///
/// If the action panics, the panic is re-raised on the calling thread. On
/// the cross-context path the payload is caught on the target thread,
/// carried back with the completion signal, and resumed here. A failure
/// inside the action is never silently swallowed, and it never tears down
/// the target context's loop.
pub fn run_sync<C, F, R>(context: &C, action: F) -> R
where
    C: ExecutionContext + ?Sized,
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if context.is_current() {
        tracing::trace!(
            target: "weft_threading::dispatch",
            "caller already on target context, running inline"
        );
        return action();
    }

    let gate = WaitGate::new();
    let slot: Arc<Mutex<Option<thread::Result<R>>>> = Arc::new(Mutex::new(None));

    let completion = gate.clone();
    let outcome_slot = slot.clone();
    context.post(Box::new(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(action));
        *outcome_slot.lock() = Some(outcome);
        completion.signal();
    }));

    tracing::trace!(
        target: "weft_threading::dispatch",
        "action queued to target context, blocking caller"
    );
    gate.wait();

    let outcome = slot
        .lock()
        .take()
        .expect("dispatch outcome recorded before completion signal");
    match outcome {
        Ok(value) => value,
        Err(payload) => {
            tracing::warn!(
                target: "weft_threading::dispatch",
                "dispatched action panicked on target thread, re-raising on caller"
            );
            panic::resume_unwind(payload)
        }
    }
}

/// Queue `action` on `context`'s thread and return immediately.
pub fn post<C, F>(context: &C, action: F)
where
    C: ExecutionContext + ?Sized,
    F: FnOnce() + Send + 'static,
{
    context.post(Box::new(action));
}
