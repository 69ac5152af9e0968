//! Queues of trigger passes that run when the owner decides to drain them.
//!
//! Deferral decouples the moment an event is raised from the moment its handlers run. A task
//! captures everything it needs at submission time and receives the target it should run
//! against (an emitter, a keyed dispatcher, ...) when it is drained. Nothing drains a queue
//! automatically.
//!
//! * [`LocalDeferredQueue`] is the single-owner flavour.
//! * [`DeferredQueue`] can be filled and drained from any thread and keeps strict FIFO order
//!   even when several threads drain it at the same time.
//! * [`Deferred`] wraps any [`Emit`][crate::Emit] implementation and turns its triggers into
//!   deferred tasks.

mod decorator;
mod local;
mod sync;

pub use decorator::Deferred;
pub use local::LocalDeferredQueue;
pub use sync::DeferredQueue;
