use std::fmt;
use std::ops::Deref;

use crate::{Emit, LocalDeferredQueue};

/// Wraps any [`Emit`] implementation so that triggering it enqueues the trigger pass instead of
/// running it.
///
/// Deferred passes run, in submission order, only when the owner calls
/// [`drain_one()`][Self::drain_one] or [`drain_all()`][Self::drain_all]. The wrapped value is
/// reachable through [`Deref`], so subscriptions and immediate triggers go straight to it.
///
/// Arguments are either captured when the trigger is deferred ([`trigger()`][Self::trigger]) or
/// produced when the pass finally runs ([`trigger_with()`][Self::trigger_with]).
///
/// The decorator is single-owner. [`Emitter`][crate::Emitter] has its own thread-safe deferred
/// queue built in.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use emitter::{Deferred, LocalEmitter};
///
/// let emitter = Deferred::new(LocalEmitter::<u32>::new());
/// let total = Rc::new(Cell::new(0));
///
/// emitter.on({
///     let total = Rc::clone(&total);
///     move |value| total.set(total.get() + value)
/// });
///
/// emitter.trigger(1);
/// emitter.trigger(2);
/// assert_eq!(total.get(), 0);
///
/// assert_eq!(emitter.drain_all(), 2);
/// assert_eq!(total.get(), 3);
/// ```
pub struct Deferred<E> {
    inner: E,
    queue: LocalDeferredQueue<E>,
}

impl<E> Deferred<E> {
    /// Wraps `inner`, starting with an empty queue.
    #[must_use]
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            queue: LocalDeferredQueue::new(),
        }
    }

    /// Defers a trigger pass with arguments captured now.
    pub fn trigger<A>(&self, args: A)
    where
        E: Emit<A>,
        A: 'static,
    {
        self.queue.enqueue(move |inner: &E| inner.emit(args));
        tracing::trace!(pending = self.queue.len(), "deferred trigger enqueued");
    }

    /// Defers a trigger pass whose arguments are produced by `producer` when the pass runs.
    ///
    /// This lets the pass observe state as of draining rather than as of submission.
    pub fn trigger_with<A, F>(&self, producer: F)
    where
        E: Emit<A>,
        F: FnOnce() -> A + 'static,
    {
        self.queue.enqueue(move |inner: &E| inner.emit(producer()));
        tracing::trace!(pending = self.queue.len(), "deferred trigger enqueued");
    }

    /// Runs the oldest deferred pass, if any. Returns whether more passes are pending.
    pub fn drain_one(&self) -> bool {
        self.queue.drain_one(&self.inner)
    }

    /// Runs deferred passes until none are pending and returns how many ran.
    ///
    /// Passes deferred by handlers while draining are run by the same call.
    pub fn drain_all(&self) -> usize {
        let executed = self.queue.drain_all(&self.inner);
        tracing::trace!(executed, "drained deferred triggers");
        executed
    }

    /// Discards all pending passes without running them and returns how many were discarded.
    pub fn clear_deferred(&self) -> usize {
        let discarded = self.queue.clear();
        tracing::debug!(discarded, "discarded deferred triggers");
        discarded
    }

    /// The number of pending passes.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// The wrapped value.
    #[must_use]
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Unwraps the decorator, discarding pending passes.
    #[must_use]
    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E> Deref for Deferred<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.inner
    }
}

impl<E, A> Emit<A> for Deferred<E>
where
    E: Emit<A>,
    A: 'static,
{
    fn emit(&self, args: A) {
        self.trigger(args);
    }
}

impl<E: fmt::Debug> fmt::Debug for Deferred<E> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("inner", &self.inner)
            .field("queue", &self.queue)
            .finish()
    }
}
