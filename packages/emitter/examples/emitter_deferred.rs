//! Deferring triggers: producing events on worker threads and delivering them on the owning
//! thread, and wrapping a keyed dispatcher in a deferring decorator.

use std::sync::Arc;
use std::thread;

use emitter::{Deferred, Emitter, KeyedDispatcher};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    println!("=== Cross-thread deferral ===");
    cross_thread();

    println!("\n=== Deferred keyed dispatch ===");
    keyed();
}

fn cross_thread() {
    let progress = Arc::new(Emitter::<(usize, u32)>::new());
    progress.on(|(worker, percent)| {
        println!(
            "worker {worker} at {percent}% (delivered on {:?})",
            thread::current().id()
        );
    });

    let workers: Vec<_> = (0..3)
        .map(|worker| {
            let progress = Arc::clone(&progress);
            thread::spawn(move || {
                for percent in [50, 100] {
                    progress.defer((worker, percent));
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    println!("pending on {:?}: {}", thread::current().id(), progress.pending_deferred());
    let delivered = progress.drain_all();
    println!("delivered {delivered} deferred triggers");
}

fn keyed() {
    let commands = Deferred::new(KeyedDispatcher::<&'static str, Vec<String>>::new());

    commands.on("greet", |arguments| println!("hello, {}", arguments.join(" and ")));
    commands.on("quit", |_| println!("bye"));

    commands.trigger(("greet", vec!["Ana".to_string(), "Bo".to_string()]));
    commands.trigger(("unknown", Vec::new()));
    commands.trigger(("quit", Vec::new()));

    println!("{} commands queued", commands.pending());
    while commands.drain_one() {}
    println!("{} commands queued after draining", commands.pending());
}
