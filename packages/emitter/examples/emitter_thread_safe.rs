//! Triggering a thread-safe emitter from worker threads, blocking on it, awaiting it and
//! attaching handlers that run on an executor.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use emitter::{Emitter, ThreadExecutor};
use futures::executor::block_on;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let downloaded = Arc::new(
        Emitter::<(String, usize)>::builder()
            .name("downloaded")
            .executor(ThreadExecutor::with_thread_name("download-handler"))
            .build(),
    );

    downloaded.async_on(|(file, bytes)| {
        let thread = thread::current();
        println!(
            "[{}] {file} finished with {bytes} bytes",
            thread.name().unwrap_or("unnamed")
        );
    });

    let first = downloaded.future_once();

    let worker = thread::spawn({
        let downloaded = Arc::clone(&downloaded);
        move || {
            for (file, bytes) in [("a.txt", 120), ("b.txt", 4096)] {
                thread::sleep(Duration::from_millis(20));
                downloaded.trigger((file.to_string(), bytes));
            }
        }
    });

    match block_on(first) {
        Ok((file, _)) => println!("first download: {file}"),
        Err(error) => println!("no download completed: {error}"),
    }

    worker.join().unwrap();

    // Nothing triggers any more, so this wait times out.
    let fired = downloaded.wait(Some(Duration::from_millis(50)));
    println!("another download within 50 ms: {fired}");

    // Give the asynchronous handlers a moment to print before exiting.
    thread::sleep(Duration::from_millis(50));
}
