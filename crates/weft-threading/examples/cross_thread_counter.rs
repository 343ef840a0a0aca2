//! Cross-thread dispatch walkthrough.
//!
//! Spins up an event thread, dispatches work to it synchronously, and uses
//! a shared guard to run cleanup once every participant is done.
//!
//! Run with: cargo run -p weft-threading --example cross_thread_counter

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::thread;

use weft_threading::{EventThreadBuilder, SharedGuard, post, run_sync};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let event_thread = EventThreadBuilder::new().name("counter-loop").build();
    let context = event_thread.context();

    let counter = Arc::new(AtomicI32::new(0));

    // Cleanup that must run exactly once, after the last worker finishes.
    let guard = SharedGuard::new(|| {
        println!("all workers done, running deferred cleanup");
    });

    let mut workers = Vec::new();
    for worker in 0..4 {
        let context = context.clone();
        let counter = counter.clone();
        let guard = guard.clone();
        workers.push(thread::spawn(move || {
            for _ in 0..5 {
                let counter = counter.clone();
                let value = run_sync(&context, move || counter.fetch_add(1, Ordering::SeqCst) + 1);
                println!("worker {worker}: counter is now {value}");
            }
            drop(guard);
        }));
    }

    // Release the main thread's handle; the cleanup still waits for the
    // worker handles.
    drop(guard);

    for worker in workers {
        worker.join().expect("worker thread panicked");
    }

    // Every increment happened on the event thread, in dispatch order.
    let counter = counter.clone();
    post(&context, move || {
        println!(
            "event thread {:?} saw a final count of {}",
            thread::current().id(),
            counter.load(Ordering::SeqCst)
        );
    });

    event_thread.stop_and_join();
}
