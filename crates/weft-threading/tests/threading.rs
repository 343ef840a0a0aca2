//! End-to-end scenarios for dispatch and guards.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::thread;

use weft_threading::{
    EventThread, EventThreadBuilder, ExecutionContext, ScopeGuard, SharedGuard, post, run_sync,
};

#[test]
fn test_same_context_dispatch_is_inline() {
    let event_thread = EventThread::new();
    let context = event_thread.context();

    let count = Arc::new(AtomicI32::new(9));

    // Enter the event thread, then dispatch toward it again from inside:
    // the nested call must execute in place on the very same thread.
    let count_clone = count.clone();
    let nested_context = context.clone();
    let (loop_tid, nested_tid) = run_sync(&context, move || {
        let loop_tid = thread::current().id();
        let count_inner = count_clone.clone();
        let nested_tid = run_sync(&nested_context, move || {
            count_inner.fetch_add(1, Ordering::SeqCst);
            thread::current().id()
        });
        assert_eq!(count_clone.load(Ordering::SeqCst), 10);
        (loop_tid, nested_tid)
    });

    assert_eq!(loop_tid, nested_tid);
    assert_eq!(count.load(Ordering::SeqCst), 10);
    event_thread.stop_and_join();
}

#[test]
fn test_cross_thread_dispatch_increments_counter() {
    let event_thread = EventThreadBuilder::new().name("dispatch-target").build();
    let context = event_thread.context();

    let count = Arc::new(AtomicI32::new(9));
    let caller_tid = thread::current().id();

    let count_clone = count.clone();
    let ran_on = run_sync(&context, move || {
        count_clone.fetch_add(1, Ordering::SeqCst);
        thread::current().id()
    });

    assert_eq!(count.load(Ordering::SeqCst), 10);
    assert_eq!(ran_on, context.thread_id());
    assert_ne!(ran_on, caller_tid);
    event_thread.stop_and_join();
}

#[test]
fn test_dispatch_observes_previously_posted_work() {
    let event_thread = EventThread::new();
    let context = event_thread.context();

    let count = Arc::new(AtomicI32::new(0));
    for _ in 0..20 {
        let count_clone = count.clone();
        post(&context, move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
    }

    // FIFO per context: the sync dispatch queues behind all twenty posts.
    let count_clone = count.clone();
    let seen = run_sync(&context, move || count_clone.load(Ordering::SeqCst));
    assert_eq!(seen, 20);

    event_thread.stop_and_join();
}

#[test]
fn test_panic_transport_does_not_kill_the_loop() {
    let event_thread = EventThread::new();
    let context = event_thread.context();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_sync(&context, || panic!("dispatched action failed"));
    }));
    assert!(outcome.is_err(), "panic must re-raise on the caller");

    // The loop thread must have survived the panic.
    assert!(event_thread.is_running());
    assert_eq!(run_sync(&context, || 1 + 1), 2);

    event_thread.stop_and_join();
}

#[test]
fn test_scope_guard_runs_at_scope_exit() {
    let count = Arc::new(AtomicI32::new(9));
    {
        let count_clone = count.clone();
        let _guard = ScopeGuard::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(count.load(Ordering::SeqCst), 9);
    }
    assert_eq!(count.load(Ordering::SeqCst), 10);
}

#[test]
fn test_shared_guard_fires_after_last_owner() {
    let count = Arc::new(AtomicI32::new(0));

    let count_clone = count.clone();
    let a = SharedGuard::new(move || {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });
    let b = a.clone();

    drop(a);
    assert_eq!(count.load(Ordering::SeqCst), 0);

    drop(b);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shared_guard_nested_scope_handoff() {
    let count = Arc::new(AtomicI32::new(0));

    {
        let mut outer = SharedGuard::default();
        assert!(!outer.is_armed());
        {
            let count_clone = count.clone();
            let inner = SharedGuard::new(move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            });
            outer = inner.clone();
            // `inner` goes out of scope here.
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(outer.is_armed());
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shared_guard_released_across_threads_fires_once() {
    let count = Arc::new(AtomicI32::new(0));

    let count_clone = count.clone();
    let guard = SharedGuard::new(move || {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });

    let mut handles = Vec::new();
    for _ in 0..6 {
        let local = guard.clone();
        handles.push(thread::spawn(move || {
            drop(local);
        }));
    }
    drop(guard);
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_guard_travels_through_dispatch() {
    let event_thread = EventThread::new();
    let context = event_thread.context();

    let count = Arc::new(AtomicI32::new(0));

    let count_clone = count.clone();
    let guard = SharedGuard::new(move || {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });

    // Ship a clone to the event thread and release it there; the caller's
    // handle still pins the action.
    let shipped = guard.clone();
    run_sync(&context, move || {
        drop(shipped);
    });
    assert_eq!(count.load(Ordering::SeqCst), 0);

    drop(guard);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    event_thread.stop_and_join();
}

#[test]
fn test_event_thread_drains_queue_on_stop() {
    let event_thread = EventThread::new();
    let context = event_thread.context();

    let count = Arc::new(AtomicI32::new(0));
    for _ in 0..10 {
        let count_clone = count.clone();
        post(&context, move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
    }

    event_thread.stop_and_join();
    assert_eq!(count.load(Ordering::SeqCst), 10);

    // Stopped loop: further posts are discarded, not queued.
    let count_clone = count.clone();
    post(&context, move || {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(count.load(Ordering::SeqCst), 10);
}

#[test]
fn test_two_contexts_are_independent() {
    let first = EventThreadBuilder::new().name("first-loop").build();
    let second = EventThreadBuilder::new().name("second-loop").build();

    let first_tid = run_sync(&first.context(), || thread::current().id());
    let second_tid = run_sync(&second.context(), || thread::current().id());

    assert_ne!(first_tid, second_tid);
    assert_eq!(first_tid, first.context().thread_id());
    assert_eq!(second_tid, second.context().thread_id());

    first.stop_and_join();
    second.stop_and_join();
}
