//! Execution-context abstraction for thread-affine dispatch.
//!
//! An [`ExecutionContext`] names a thread that is actively draining a task
//! queue. The dispatcher (see [`crate::dispatch`]) only needs two things from
//! it: "is the caller already on this thread?" and "hand this closure to the
//! thread's queue". The run loop itself is supplied by the surrounding
//! application; [`crate::event_thread::EventThread`] provides one for
//! applications (and tests) that don't already have their own.
//!
//! # Example
//!
//! ```
//! use std::thread;
//!
//! use weft_threading::{EventThread, ExecutionContext};
//!
//! let event_thread = EventThread::new();
//! let context = event_thread.context();
//!
//! // The handle knows which thread it stands for.
//! assert_ne!(context.thread_id(), thread::current().id());
//! assert!(!context.is_current());
//!
//! event_thread.stop_and_join();
//! ```

use std::thread::{self, ThreadId};

/// A boxed unit of work posted to a context's queue.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A thread with an attached run loop that executes posted tasks.
///
/// Implementations must uphold two contracts relied on by
/// [`crate::dispatch::run_sync`]:
///
/// - [`thread_id`](ExecutionContext::thread_id) is the identity of the one
///   thread that executes every posted task.
/// - Tasks posted from a single thread run in the order they were posted,
///   after any work already queued (FIFO per context).
///
/// Whether the thread is actually draining its queue is the caller's
/// responsibility; posting to a stalled context is not detected here.
pub trait ExecutionContext {
    /// Identity of the thread this context executes on.
    fn thread_id(&self) -> ThreadId;

    /// Whether the calling thread is this context's thread.
    fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id()
    }

    /// Queue a task for execution on this context's thread.
    fn post(&self, task: Task);
}

impl<C: ExecutionContext + ?Sized> ExecutionContext for &C {
    fn thread_id(&self) -> ThreadId {
        (**self).thread_id()
    }

    fn is_current(&self) -> bool {
        (**self).is_current()
    }

    fn post(&self, task: Task) {
        (**self).post(task);
    }
}
