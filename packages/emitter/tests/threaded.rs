//! End-to-end scenarios for the thread-safe emitter: cross-thread triggers, waits, futures,
//! asynchronous handlers and deferred delivery.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, ThreadId};
use std::time::Duration;

use emitter::{Emitter, ThreadExecutor};
use testing::{CallLog, with_watchdog};

type Args = (i32, i32, String);

fn args(a: i32, b: i32, label: &str) -> Args {
    (a, b, label.to_string())
}

fn await_subscribers<A>(emitter: &Emitter<A>, count: usize) {
    while emitter.count() < count {
        thread::yield_now();
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn trigger_from_other_thread_then_drain_here() {
    with_watchdog(|| {
        let emitter = Arc::new(Emitter::<Args>::new());
        let log = CallLog::new();
        emitter.on({
            let log = log.clone();
            move |(a, b, label): &Args| log.record(format!("{label}:{}", a + b))
        });

        thread::spawn({
            let emitter = Arc::clone(&emitter);
            move || {
                emitter.defer(args(1, 2, "first"));
                emitter.defer(args(3, 4, "second"));
            }
        })
        .join()
        .unwrap();

        assert!(log.is_empty());
        assert_eq!(emitter.pending_deferred(), 2);
        assert_eq!(emitter.drain_all(), 2);
        assert_eq!(log.entries(), ["first:3", "second:7"]);
    });
}

#[test]
#[cfg_attr(miri, ignore)]
fn future_once_carries_arguments() {
    with_watchdog(|| {
        let emitter = Arc::new(Emitter::<Args>::new());
        let next = emitter.future_once();

        let producer = thread::spawn({
            let emitter = Arc::clone(&emitter);
            move || {
                await_subscribers(&emitter, 1);
                emitter.trigger(args(213, 999, "B"));
            }
        });

        assert_eq!(next.recv().unwrap(), args(213, 999, "B"));
        producer.join().unwrap();
        assert!(!emitter.has_any());
    });
}

#[test]
#[cfg_attr(miri, ignore)]
fn wait_runs_handler_on_triggering_thread() {
    with_watchdog(|| {
        let emitter = Arc::new(Emitter::<Args>::new());

        let producer = thread::spawn({
            let emitter = Arc::clone(&emitter);
            move || {
                await_subscribers(&emitter, 1);
                emitter.trigger(args(1, 2, "A"));
                thread::current().id()
            }
        });

        let (sender, receiver) = mpsc::channel::<ThreadId>();
        let fired = emitter.wait_with(
            move |_| sender.send(thread::current().id()).unwrap(),
            None,
        );
        let producer_id = producer.join().unwrap();

        assert!(fired);
        assert_eq!(receiver.recv().unwrap(), producer_id);
        assert_ne!(producer_id, thread::current().id());
    });
}

#[test]
#[cfg_attr(miri, ignore)]
fn timed_out_wait_never_runs_its_handler() {
    with_watchdog(|| {
        let emitter = Arc::new(Emitter::<Args>::new());
        let invoked = Arc::new(AtomicU32::new(0));

        let fired = emitter.wait_with(
            {
                let invoked = Arc::clone(&invoked);
                move |_| {
                    invoked.fetch_add(1, Ordering::Relaxed);
                }
            },
            Some(Duration::from_millis(50)),
        );
        assert!(!fired);
        assert!(!emitter.has_any());

        thread::spawn({
            let emitter = Arc::clone(&emitter);
            move || emitter.trigger(args(1, 2, "late"))
        })
        .join()
        .unwrap();

        assert_eq!(invoked.load(Ordering::Relaxed), 0);
    });
}

#[test]
#[cfg_attr(miri, ignore)]
fn async_once_runs_deferred_trigger_elsewhere() {
    with_watchdog(|| {
        let emitter = Emitter::<Args>::builder()
            .executor(ThreadExecutor::with_thread_name("async-handler"))
            .build();
        let (sender, receiver) = mpsc::channel();

        emitter.async_once(move |(a, b, _): &Args| {
            sender
                .send((a + b, thread::current().name().map(str::to_string)))
                .unwrap();
        });

        emitter.defer(args(4, 5, "C"));
        assert_eq!(emitter.drain_all(), 1);

        let (sum, thread_name) = receiver.recv().unwrap();
        assert_eq!(sum, 9);
        assert_eq!(thread_name.as_deref(), Some("async-handler"));
        assert!(!emitter.has_any());
    });
}

#[test]
#[cfg_attr(miri, ignore)]
fn async_wait_reports_either_outcome() {
    with_watchdog(|| {
        let emitter = Arc::new(Emitter::<u32>::new());
        let log = CallLog::new();
        let (done_tx, done_rx) = mpsc::channel();

        emitter.async_wait(
            {
                let log = log.clone();
                move |value: &u32| log.record(format!("fired:{value}"))
            },
            Duration::from_secs(10),
            {
                let log = log.clone();
                move || log.record("unexpected timeout")
            },
        );
        emitter.trigger(7);

        emitter.async_wait(
            |_: &u32| {},
            Duration::from_millis(20),
            {
                let log = log.clone();
                move || {
                    log.record("timed out");
                    done_tx.send(()).unwrap();
                }
            },
        );
        done_rx.recv().unwrap();

        assert_eq!(log.entries(), ["fired:7", "timed out"]);
        assert!(!emitter.has_any());
    });
}

#[test]
#[cfg_attr(miri, ignore)]
fn remove_all_releases_blocked_waiter() {
    with_watchdog(|| {
        let emitter = Arc::new(Emitter::<u32>::new());

        let waiter = thread::spawn({
            let emitter = Arc::clone(&emitter);
            move || emitter.wait(None)
        });

        await_subscribers(&emitter, 1);
        emitter.remove_all();

        assert!(!waiter.join().unwrap());
    });
}

#[test]
#[cfg_attr(miri, ignore)]
fn once_handler_fires_once_under_contention() {
    with_watchdog(|| {
        const TRIGGERING_THREADS: usize = 8;

        let emitter = Arc::new(Emitter::<u32>::new());
        let invoked = Arc::new(AtomicU32::new(0));
        emitter.once({
            let invoked = Arc::clone(&invoked);
            move |_| {
                invoked.fetch_add(1, Ordering::Relaxed);
            }
        });

        let threads: Vec<_> = (0..TRIGGERING_THREADS)
            .map(|_| {
                let emitter = Arc::clone(&emitter);
                thread::spawn(move || emitter.trigger(1))
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(invoked.load(Ordering::Relaxed), 1);
        assert!(!emitter.has_any());
    });
}
