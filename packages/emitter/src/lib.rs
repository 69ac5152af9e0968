//! Typed in-process event emitters.
//!
//! An emitter holds a set of handlers that all accept the same argument type `A` (typically a
//! tuple). Triggering the emitter invokes every handler with a reference to the arguments.
//! Handlers can be subscribed for every trigger or for the next trigger only, and removed again
//! through the [`Handle`] returned when subscribing.
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use emitter::LocalEmitter;
//!
//! let clicked = LocalEmitter::<(i32, i32)>::new();
//! let clicks = Rc::new(Cell::new(0));
//!
//! let handle = clicked.on({
//!     let clicks = Rc::clone(&clicks);
//!     move |(x, y)| {
//!         println!("clicked at {x},{y}");
//!         clicks.set(clicks.get() + 1);
//!     }
//! });
//! clicked.once(|_| println!("first click!"));
//!
//! clicked.trigger((10, 20));
//! clicked.trigger((30, 40));
//! assert_eq!(clicks.get(), 2);
//!
//! assert!(clicked.remove(handle));
//! assert!(!clicked.has_any());
//! ```
//!
//! # Flavours
//!
//! | Type                  | Threads         | Extras                                            |
//! |-----------------------|-----------------|---------------------------------------------------|
//! | [`LocalEmitter`]      | single owner    | nested triggers from handlers                     |
//! | [`Emitter`]           | any             | blocking waits, [`NextEvent`], async handlers     |
//! | [`KeyedDispatcher`]   | single owner    | independent handlers per key                      |
//! | [`Deferred`]          | single owner    | turns triggers of any [`Emit`] type into a queue  |
//!
//! [`Emitter`] also owns a thread-safe deferred queue, so events can be deferred on one thread
//! and delivered on another.
//!
//! # Dispatch rules
//!
//! * A trigger visits the handlers that are live when it starts, newest first unless configured
//!   otherwise with [`DispatchOrder`].
//! * Handlers subscribed while a trigger is running are first invoked by the next trigger.
//! * Handlers removed while a trigger is running are not invoked by it if they were not
//!   visited yet. No handler is ever invoked twice by one trigger.
//! * A once-handler is removed in the same step that invokes it.
//! * A panicking handler stops the trigger and the panic reaches the caller. The emitter stays
//!   consistent and usable.
//!
//! # Deferred delivery
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//!
//! use emitter::Emitter;
//!
//! let progress = Arc::new(Emitter::<u32>::new());
//! let next = progress.future_once();
//!
//! let worker = thread::spawn({
//!     let progress = Arc::clone(&progress);
//!     move || {
//!         for percent in [25, 50, 100] {
//!             progress.defer(percent);
//!         }
//!     }
//! });
//! worker.join().unwrap();
//!
//! // Delivered on this thread, in submission order.
//! assert_eq!(progress.drain_all(), 3);
//! assert_eq!(next.recv().unwrap(), 25);
//! ```
//!
//! # Logging
//!
//! Emitters report subscriptions, removals and completed trigger passes through [`tracing`] at
//! the `trace` level, wait timeouts and discarded deferred triggers at the `debug` level, and
//! panics of asynchronous handlers at the `error` level.

mod builder;
mod constants;
mod deferred;
mod dispatch;
mod emit;
mod error;
mod exclusive;
mod executor;
mod handle;
mod keyed;
mod local;
mod local_builder;
mod next_event;
mod registry;
mod sync;

pub use builder::EmitterBuilder;
pub(crate) use constants::*;
pub use deferred::{Deferred, DeferredQueue, LocalDeferredQueue};
pub(crate) use dispatch::dispatch;
pub use dispatch::DispatchOrder;
pub use emit::Emit;
pub use error::{Error, Result};
pub(crate) use exclusive::ExclusiveSection;
pub(crate) use executor::spawn_detached;
pub use executor::{Executor, ThreadExecutor};
pub use handle::Handle;
pub use keyed::KeyedDispatcher;
pub use local::LocalEmitter;
pub use local_builder::LocalEmitterBuilder;
pub use next_event::NextEvent;
pub(crate) use registry::{HandlerRegistry, RegistryAccess};
pub use sync::Emitter;
