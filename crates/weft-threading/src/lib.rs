//! Threading helpers for event-loop applications.
//!
//! This crate provides the cross-thread plumbing of the Weft toolkit:
//!
//! - **Synchronous Dispatch**: run a closure on another thread's run loop
//!   and block until it completes ([`run_sync`]), or queue it and move on
//!   ([`post`])
//! - **Execution Contexts**: the [`ExecutionContext`] seam between the
//!   dispatcher and whatever run loop the application supplies
//! - **Event Threads**: a ready-made [`EventThread`] run loop for
//!   applications that don't bring their own
//! - **Wait Gates**: the single-use blocking handshake ([`WaitGate`])
//!   underneath the dispatcher
//! - **Guards**: scope-exit cleanup as a value, either move-only
//!   ([`ScopeGuard`]) or reference-counted across threads ([`SharedGuard`])
//!
//! # Dispatch Example
//!
//! ```
//! use weft_threading::{EventThread, run_sync};
//!
//! let event_thread = EventThread::new();
//!
//! // Runs on the event thread; the caller blocks until it's done.
//! let length = run_sync(&event_thread.context(), || "hello".len());
//! assert_eq!(length, 5);
//!
//! event_thread.stop_and_join();
//! ```
//!
//! # Guard Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! use weft_threading::SharedGuard;
//!
//! let released = Arc::new(AtomicBool::new(false));
//!
//! let released_clone = released.clone();
//! let guard = SharedGuard::new(move || {
//!     released_clone.store(true, Ordering::SeqCst);
//! });
//!
//! // Hand a clone to another owner; the cleanup waits for both.
//! let other = guard.clone();
//! drop(guard);
//! assert!(!released.load(Ordering::SeqCst));
//!
//! drop(other);
//! assert!(released.load(Ordering::SeqCst));
//! ```
//!
//! # Blocking Hazard
//!
//! [`run_sync`] has no timeout: dispatching to a context whose thread is
//! not draining its queue (stopped, or itself blocked dispatching back to
//! the caller) blocks forever. Keeping dispatch targets alive and acyclic
//! is the caller's responsibility.

pub mod context;
pub mod dispatch;
pub mod event_thread;
pub mod gate;
pub mod guard;

pub use context::{ExecutionContext, Task};
pub use dispatch::{post, run_sync};
pub use event_thread::{ContextHandle, EventThread, EventThreadBuilder, EventThreadConfig};
pub use gate::WaitGate;
pub use guard::{ScopeGuard, SharedGuard};
