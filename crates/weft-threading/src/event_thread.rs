//! A dedicated thread that drains a FIFO task queue.
//!
//! [`EventThread`] is the in-crate stand-in for a framework-supplied run
//! loop: it owns one thread, executes posted tasks sequentially in post
//! order, and hands out cloneable [`ContextHandle`]s that implement
//! [`ExecutionContext`] so the thread can be a dispatch target.
//!
//! Applications embedding this crate into a framework with its own loop
//! (a UI main thread, for instance) implement [`ExecutionContext`] over
//! that loop instead; nothing in [`crate::dispatch`] is specific to
//! `EventThread`.
//!
//! # Example
//!
//! ```
//! use weft_threading::{EventThread, run_sync};
//!
//! let event_thread = EventThread::new();
//!
//! let answer = run_sync(&event_thread.context(), || 6 * 7);
//! assert_eq!(answer, 42);
//!
//! event_thread.stop_and_join();
//! ```
//!
//! # Shutdown
//!
//! [`stop`](EventThread::stop) asks the thread to exit after draining the
//! tasks already queued; [`join`](EventThread::join) waits for it. Tasks
//! posted after `stop` are discarded. Dropping the `EventThread` requests
//! shutdown without blocking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;

use crate::context::{ExecutionContext, Task};

/// Default capacity for the task queue.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Configuration for creating an [`EventThread`].
#[derive(Debug, Clone)]
pub struct EventThreadConfig {
    /// Name for the loop thread.
    pub name: String,
    /// Stack size for the loop thread in bytes. `None` uses the default.
    pub stack_size: Option<usize>,
    /// Capacity of the task queue. Posting to a full queue blocks the
    /// poster until the loop catches up.
    pub queue_capacity: usize,
}

impl Default for EventThreadConfig {
    fn default() -> Self {
        Self {
            name: "weft-event-thread".to_string(),
            stack_size: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl EventThreadConfig {
    /// Create a new configuration with the given thread name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Builder for creating [`EventThread`]s with custom configuration.
#[derive(Debug, Default)]
pub struct EventThreadBuilder {
    config: EventThreadConfig,
}

impl EventThreadBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the stack size for the loop thread.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Set the task queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Build and start the event thread.
    pub fn build(self) -> EventThread {
        EventThread::with_config(self.config)
    }
}

/// Messages understood by the loop.
enum LoopMessage {
    /// Execute a posted task.
    Run(Task),
    /// Drain remaining tasks, then exit.
    Shutdown,
}

/// State shared between the handle side and the loop thread.
#[derive(Debug)]
struct LoopState {
    /// Whether the loop is accepting tasks.
    running: AtomicBool,
    /// Count of queued-but-unfinished tasks.
    pending_tasks: AtomicUsize,
}

impl LoopState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            pending_tasks: AtomicUsize::new(0),
        }
    }
}

/// A cloneable handle naming an [`EventThread`] as a dispatch target.
///
/// Handles are `Send + Sync` and stay valid after the owning
/// [`EventThread`] value is gone; posts to a loop that has stopped are
/// discarded with a warning.
#[derive(Debug, Clone)]
pub struct ContextHandle {
    thread_id: ThreadId,
    sender: Sender<LoopMessage>,
    state: Arc<LoopState>,
}

impl ExecutionContext for ContextHandle {
    fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    fn post(&self, task: Task) {
        if !self.state.running.load(Ordering::Acquire) {
            tracing::warn!(
                target: "weft_threading::event_thread",
                "task posted to a stopped event thread, discarding"
            );
            return;
        }

        self.state.pending_tasks.fetch_add(1, Ordering::AcqRel);
        if self.sender.send(LoopMessage::Run(task)).is_err() {
            self.state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
            tracing::warn!(
                target: "weft_threading::event_thread",
                "event thread queue disconnected, task discarded"
            );
        }
    }
}

/// A dedicated thread executing posted tasks in FIFO order.
pub struct EventThread {
    handle: ContextHandle,
    join_handle: Mutex<Option<JoinHandle<()>>>,
    state: Arc<LoopState>,
    sender: Sender<LoopMessage>,
}

impl EventThread {
    /// Create an event thread with default configuration.
    ///
    /// The thread starts immediately and begins draining its queue.
    pub fn new() -> Self {
        Self::with_config(EventThreadConfig::default())
    }

    /// Create an event thread with custom configuration.
    pub fn with_config(config: EventThreadConfig) -> Self {
        let (sender, receiver) = bounded(config.queue_capacity);
        let state = Arc::new(LoopState::new());

        let thread_state = state.clone();
        let mut builder = thread::Builder::new().name(config.name);
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let join_handle = builder
            .spawn(move || {
                event_loop(receiver, &thread_state);
                thread_state.running.store(false, Ordering::Release);
            })
            .expect("failed to spawn event thread");

        let handle = ContextHandle {
            thread_id: join_handle.thread().id(),
            sender: sender.clone(),
            state: state.clone(),
        };

        Self {
            handle,
            join_handle: Mutex::new(Some(join_handle)),
            state,
            sender,
        }
    }

    /// Get a handle naming this thread as a dispatch target.
    pub fn context(&self) -> ContextHandle {
        self.handle.clone()
    }

    /// Whether the loop is accepting tasks.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Number of queued-but-unfinished tasks.
    pub fn pending_tasks(&self) -> usize {
        self.state.pending_tasks.load(Ordering::Acquire)
    }

    /// Request the loop to exit after draining the tasks already queued.
    ///
    /// Non-blocking; new posts are rejected from this point on. Use
    /// [`join`](EventThread::join) to wait for the thread to finish.
    pub fn stop(&self) {
        self.state.running.store(false, Ordering::Release);
        let _ = self.sender.try_send(LoopMessage::Shutdown);
    }

    /// Wait for the loop thread to finish.
    ///
    /// Returns `true` if the thread was joined, `false` if it was already
    /// joined or panicked. Call [`stop`](EventThread::stop) first.
    pub fn join(&self) -> bool {
        let mut join_handle = self.join_handle.lock();
        if let Some(handle) = join_handle.take() {
            handle.join().is_ok()
        } else {
            false
        }
    }

    /// Stop the loop and wait for it to finish.
    pub fn stop_and_join(&self) -> bool {
        self.stop();
        self.join()
    }
}

impl ExecutionContext for EventThread {
    fn thread_id(&self) -> ThreadId {
        self.handle.thread_id
    }

    fn post(&self, task: Task) {
        self.handle.post(task);
    }
}

impl Default for EventThread {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventThread {
    fn drop(&mut self) {
        self.stop();
        // Shutdown only; joining in drop could block arbitrarily.
    }
}

static_assertions::assert_impl_all!(ContextHandle: Send, Sync, Clone);
static_assertions::assert_impl_all!(EventThread: Send, Sync);

/// The loop body: run tasks in arrival order until shutdown.
fn event_loop(receiver: Receiver<LoopMessage>, state: &LoopState) {
    tracing::debug!(target: "weft_threading::event_thread", "event thread started");

    while let Ok(message) = receiver.recv() {
        match message {
            LoopMessage::Run(task) => {
                task();
                state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
            }
            LoopMessage::Shutdown => {
                let drained = drain_remaining(&receiver, state);
                if drained > 0 {
                    tracing::debug!(
                        target: "weft_threading::event_thread",
                        drained,
                        "ran remaining tasks before shutdown"
                    );
                }
                break;
            }
        }
    }

    tracing::debug!(target: "weft_threading::event_thread", "event thread exiting");
}

/// Run whatever is still queued at shutdown time.
fn drain_remaining(receiver: &Receiver<LoopMessage>, state: &LoopState) -> usize {
    let mut drained = 0;
    while let Ok(message) = receiver.try_recv() {
        if let LoopMessage::Run(task) = message {
            task();
            state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
            drained += 1;
        }
    }
    drained
}
