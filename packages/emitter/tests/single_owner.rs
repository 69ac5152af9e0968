//! End-to-end scenarios for the single-owner emitters: plain, deferred and keyed.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use emitter::{Deferred, DispatchOrder, Emit, KeyedDispatcher, LocalEmitter};
use testing::CallLog;

type Args = (i32, i32, String);

fn args(a: i32, b: i32, label: &str) -> Args {
    (a, b, label.to_string())
}

fn summing(total: &Rc<Cell<i32>>) -> impl FnMut(&Args) + 'static {
    let total = Rc::clone(total);
    move |(a, b, _)| total.set(total.get() + a + b)
}

#[test]
fn on_and_once_accumulate() {
    let persistent = Rc::new(Cell::new(0));
    let single = Rc::new(Cell::new(0));
    let emitter = LocalEmitter::<Args>::new();

    emitter.on(summing(&persistent));
    emitter.once(summing(&single));

    emitter.trigger(args(1, 5, "A"));
    assert_eq!((persistent.get(), single.get()), (6, 6));

    emitter.trigger(args(3, 7, "B"));
    assert_eq!((persistent.get(), single.get()), (16, 6));
}

#[test]
fn removed_handlers_stay_silent() {
    let sum = Rc::new(Cell::new(0));
    let emitter = LocalEmitter::<Args>::new();

    let handle = emitter.on(summing(&sum));
    emitter.trigger(args(1, 3, "A"));
    emitter.trigger(args(5, 7, "B"));
    assert!(emitter.remove(handle));
    emitter.trigger(args(100, 100, "C"));
    assert_eq!(sum.get(), 16);

    let handle = emitter.once(summing(&sum));
    assert!(emitter.remove(handle));
    assert!(!emitter.remove(handle));
    emitter.trigger(args(11, 13, "D"));
    assert_eq!(sum.get(), 16);
}

#[test]
fn remove_all_silences_every_handler() {
    let sum = Rc::new(Cell::new(0));
    let emitter = LocalEmitter::<Args>::new();
    emitter.on(summing(&sum));
    emitter.on(summing(&sum));

    emitter.trigger(args(1, 3, "A"));
    emitter.trigger(args(5, 7, "B"));
    assert_eq!(sum.get(), 32);

    emitter.remove_all();
    assert!(!emitter.has_any());
    emitter.trigger(args(1, 1, "C"));
    assert_eq!(sum.get(), 32);
}

#[test]
fn handler_removes_itself_from_within() {
    let sum = Rc::new(Cell::new(0));
    let emitter = Rc::new(LocalEmitter::<Args>::new());
    let own_handle = Rc::new(Cell::new(None));

    let handle = emitter.on({
        let sum = Rc::clone(&sum);
        let emitter = Rc::downgrade(&emitter);
        let own_handle = Rc::clone(&own_handle);
        move |(a, _, _)| {
            sum.set(sum.get() + a);
            if let (Some(emitter), Some(handle)) = (emitter.upgrade(), own_handle.get()) {
                emitter.remove(handle);
            }
        }
    });
    own_handle.set(Some(handle));

    emitter.trigger(args(11, 13, "B"));
    emitter.trigger(args(11, 13, "B"));

    assert_eq!(sum.get(), 11);
}

#[test]
fn dispatch_order_is_configurable() {
    let log = CallLog::new();

    let newest_first = LocalEmitter::<u32>::new();
    newest_first.on(log.recorder("h1:"));
    newest_first.on(log.recorder("h2:"));
    newest_first.on(log.recorder("h3:"));
    newest_first.trigger(1);

    let oldest_first = LocalEmitter::<u32>::builder()
        .dispatch_order(DispatchOrder::OldestFirst)
        .build();
    oldest_first.on(log.recorder("h1:"));
    oldest_first.on(log.recorder("h2:"));
    oldest_first.trigger(2);

    assert_eq!(log.entries(), ["h3:1", "h2:1", "h1:1", "h1:2", "h2:2"]);
}

#[test]
fn deferred_emitter_runs_one_trigger_per_drain_step() {
    let persistent = Rc::new(Cell::new(0));
    let single = Rc::new(Cell::new(0));
    let emitter = Deferred::new(LocalEmitter::<Args>::new());
    emitter.on(summing(&persistent));
    emitter.once(summing(&single));

    emitter.trigger(args(1, 5, "A"));
    emitter.trigger(args(3, 7, "B"));
    assert_eq!((persistent.get(), single.get()), (0, 0));

    assert!(emitter.drain_one());
    assert_eq!((persistent.get(), single.get()), (6, 6));

    assert!(!emitter.drain_one());
    assert_eq!((persistent.get(), single.get()), (16, 6));

    emitter.trigger(args(1, 1, "C"));
    emitter.remove_all();
    assert_eq!(emitter.drain_all(), 1);
    assert_eq!(persistent.get(), 16);
}

#[test]
fn deferral_goes_through_the_emit_trait() {
    fn raise(target: &impl Emit<u32>, value: u32) {
        target.emit(value);
    }

    let log = CallLog::new();
    let immediate = LocalEmitter::<u32>::new();
    immediate.on(log.recorder("immediate:"));
    let deferred = Deferred::new(LocalEmitter::<u32>::new());
    deferred.on(log.recorder("deferred:"));

    raise(&deferred, 1);
    raise(&immediate, 2);
    deferred.drain_all();

    assert_eq!(log.entries(), ["immediate:2", "deferred:1"]);
}

#[test]
fn keyed_dispatch_reaches_only_its_key() {
    let dispatcher = KeyedDispatcher::<String, Args>::new();
    let sum = Rc::new(Cell::new(0));
    let count = Rc::new(Cell::new(0));

    let handle = dispatcher.on("test", {
        let sum = Rc::clone(&sum);
        move |(a, b, label): &Args| {
            assert_eq!((*a, *b, label.as_str()), (12, 14, "TEST"));
            sum.set(sum.get() + a + b);
        }
    });
    dispatcher.on("test2", |_: &Args| panic!("must not run"));
    dispatcher.once("test3", {
        let count = Rc::clone(&count);
        move |_| count.set(count.get() + 1)
    });

    dispatcher.trigger("test", args(12, 14, "TEST"));
    assert!(dispatcher.remove("test", handle));
    dispatcher.trigger("test", args(12, 14, "TEST"));
    assert_eq!(sum.get(), 26);

    for _ in 0..3 {
        dispatcher.trigger("test3", args(1, 1, "TEST"));
    }
    assert_eq!(count.get(), 1);
}

#[test]
fn deferred_keyed_dispatch() {
    let dispatcher = Deferred::new(KeyedDispatcher::<&'static str, Args>::new());
    let sum = Rc::new(Cell::new(0));
    dispatcher.on("test1", summing(&sum));

    dispatcher.trigger(("test", args(12, 14, "TEST")));
    dispatcher.drain_one();
    assert_eq!(sum.get(), 0);

    dispatcher.trigger(("test1", args(12, 14, "TEST")));
    dispatcher.drain_one();
    assert_eq!(sum.get(), 26);

    dispatcher.on("test2", {
        let sum = Rc::clone(&sum);
        move |(a, b, _): &Args| sum.set(sum.get() - a - b)
    });
    dispatcher.trigger(("test2", args(5, 5, "TEST")));
    dispatcher.drain_one();
    assert_eq!(sum.get(), 16);
}

#[test]
fn nested_triggers_interleave_depth_first() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let emitter = Rc::new(LocalEmitter::<u32>::builder().name("countdown").build());

    emitter.on({
        let emitter = Rc::downgrade(&emitter);
        let log = Rc::clone(&log);
        move |value: &u32| {
            log.borrow_mut().push(format!("outer:{value}"));
            if let Some(emitter) = emitter.upgrade() {
                emitter.trigger(value + 10);
            }
        }
    });
    emitter.on({
        let log = Rc::clone(&log);
        move |value: &u32| log.borrow_mut().push(format!("inner:{value}"))
    });

    emitter.trigger(1);

    // The outer handler is skipped by the nested pass it started.
    assert_eq!(*log.borrow(), ["inner:1", "outer:1", "inner:11"]);
}
