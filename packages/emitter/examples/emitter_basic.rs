//! Subscribing, triggering and removing handlers on a single-owner emitter.
//!
//! Run with log output to see the trace records of each step.

use std::cell::Cell;
use std::rc::Rc;

use emitter::{DispatchOrder, LocalEmitter};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    println!("=== Persistent and one-shot handlers ===");
    persistent_and_once();

    println!("\n=== Dispatch order ===");
    dispatch_order();
}

fn persistent_and_once() {
    let resized = LocalEmitter::<(u32, u32)>::builder().name("resized").build();
    let area = Rc::new(Cell::new(0));

    let handle = resized.on({
        let area = Rc::clone(&area);
        move |(width, height)| area.set(width.saturating_mul(*height))
    });
    resized.once(|(width, height)| println!("first resize: {width}x{height}"));

    resized.trigger((640, 480));
    resized.trigger((800, 600));
    println!("area after two resizes: {}", area.get());

    resized.remove(handle);
    resized.trigger((1, 1));
    println!("area after removal: {}", area.get());
    println!("handlers left: {}", resized.count());
}

fn dispatch_order() {
    for order in [DispatchOrder::NewestFirst, DispatchOrder::OldestFirst] {
        let emitter = LocalEmitter::<&str>::builder().dispatch_order(order).build();

        for label in ["first", "second", "third"] {
            emitter.on(move |event| println!("{order:?}: {label} handler saw {event}"));
        }

        emitter.trigger("ping");
    }
}
