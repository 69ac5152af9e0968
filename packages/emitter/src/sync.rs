use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::{
    DEFAULT_NAME, DeferredQueue, DispatchOrder, ERR_POISONED_LOCK, Emit, EmitterBuilder,
    ExclusiveSection, Executor, Handle, HandlerRegistry, NextEvent, RegistryAccess,
    ThreadExecutor, dispatch, spawn_detached,
};

type Callback<A> = Box<dyn FnMut(&A) + Send>;

/// A thread-safe event emitter whose handlers receive a `&A` on every trigger.
///
/// Any thread may subscribe, remove and trigger. Trigger passes on one emitter are mutually
/// exclusive: a pass runs to completion before the next one starts. Handlers run on the thread
/// that triggers, unless they were subscribed with [`async_on()`][Self::async_on] or
/// [`async_once()`][Self::async_once], in which case each invocation is handed to the
/// emitter's [`Executor`].
///
/// On top of plain subscriptions the emitter offers several ways to consume "the next event":
///
/// * [`wait()`][Self::wait] and [`wait_with()`][Self::wait_with] block the calling thread.
/// * [`async_wait()`][Self::async_wait] does the same on a background task.
/// * [`future_once()`][Self::future_once] returns a [`NextEvent`] that can be received or
///   awaited.
///
/// Each emitter also owns a deferred queue: [`defer()`][Self::defer] records a trigger that
/// runs when some thread calls [`drain_one()`][Self::drain_one] or
/// [`drain_all()`][Self::drain_all].
///
/// # Re-entrancy
///
/// Handlers may subscribe, remove and query the emitter that invokes them. A synchronous
/// `trigger()`, `wait()` or drain issued from inside a handler of the same emitter would wait
/// for the running pass to finish, which can never happen, so it panics instead. Use
/// [`defer()`][Self::defer] or an asynchronous handler to raise an event from inside a handler.
///
/// Values captured by handlers are dropped while an internal lock of the emitter is held; their
/// destructors must not call into the same emitter.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
/// use std::time::Duration;
///
/// use emitter::Emitter;
///
/// let emitter = Arc::new(Emitter::<(u32, String)>::new());
///
/// let waiter = thread::spawn({
///     let emitter = Arc::clone(&emitter);
///     move || {
///         emitter.wait_with(
///             |(id, label)| println!("{id}: {label}"),
///             Some(Duration::from_secs(5)),
///         )
///     }
/// });
///
/// while !emitter.has_any() {
///     thread::yield_now();
/// }
/// emitter.trigger((1, "ready".to_string()));
///
/// assert!(waiter.join().unwrap());
/// ```
pub struct Emitter<A> {
    registry: Mutex<HandlerRegistry<Callback<A>>>,

    // Paired with `registry`. Notified after every trigger pass.
    fired: Condvar,

    triggering: ExclusiveSection,
    deferred: DeferredQueue<Self>,
    executor: Arc<dyn Executor>,
    name: Arc<str>,
}

/// A blocking wait that has subscribed its handler but not yet started waiting.
struct WaitTicket {
    handle: Handle,
    fired: Arc<AtomicBool>,
}

impl<A> Emitter<A> {
    /// Creates an emitter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(
            Arc::from(DEFAULT_NAME),
            DispatchOrder::default(),
            Arc::new(ThreadExecutor::new()),
        )
    }

    /// Starts configuring a new emitter.
    pub fn builder() -> EmitterBuilder<A> {
        EmitterBuilder::new()
    }

    pub(crate) fn from_parts(
        name: Arc<str>,
        dispatch_order: DispatchOrder,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            registry: Mutex::new(HandlerRegistry::new(dispatch_order)),
            fired: Condvar::new(),
            triggering: ExclusiveSection::new(),
            deferred: DeferredQueue::new(),
            executor,
            name,
        }
    }

    /// Subscribes a handler that is invoked on every trigger until it is removed.
    pub fn on<F>(&self, handler: F) -> Handle
    where
        F: FnMut(&A) + Send + 'static,
    {
        self.subscribe(Box::new(handler), false)
    }

    /// Subscribes a handler that is invoked on the next trigger only.
    ///
    /// Even when several threads trigger at the same time, the handler is invoked exactly once.
    pub fn once<F>(&self, handler: F) -> Handle
    where
        F: FnOnce(&A) + Send + 'static,
    {
        let mut handler = Some(handler);

        self.subscribe(
            Box::new(move |args: &A| {
                if let Some(handler) = handler.take() {
                    handler(args);
                }
            }),
            true,
        )
    }

    /// Removes a handler. Returns `false` if no live handler matched `handle`.
    ///
    /// If the handler is running on another thread at the time of the call, that invocation
    /// finishes normally.
    pub fn remove(&self, handle: Handle) -> bool {
        let removed = self.registry.with_registry(|registry| registry.remove(handle));
        tracing::trace!(emitter = %self.name, %handle, removed, "handler removal requested");
        removed
    }

    /// Removes every handler.
    ///
    /// Invocations already in progress finish normally; no handler is invoked after this call
    /// returns, not even by a pass that was already running. Pending waits return `false` and
    /// pending [`NextEvent`]s resolve to [`Error::Disconnected`][crate::Error::Disconnected].
    pub fn remove_all(&self) {
        self.registry.with_registry(HandlerRegistry::clear);
        self.fired.notify_all();
        tracing::trace!(emitter = %self.name, "all handlers removed");
    }

    /// The number of live handlers, including internal handlers of pending waits and futures.
    #[must_use]
    pub fn count(&self) -> usize {
        self.registry.with_registry(|registry| registry.len())
    }

    /// Whether any handler is subscribed.
    #[must_use]
    pub fn has_any(&self) -> bool {
        !self.registry.with_registry(|registry| registry.is_empty())
    }

    /// Invokes every handler that is live when the pass starts with a reference to `args`, then
    /// wakes up all blocked waiters.
    ///
    /// If another thread is running a pass, this call waits for it to finish first.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a handler that this emitter is currently invoking on the
    /// same thread. A panic raised by a handler propagates to the caller; waiters are still
    /// woken up.
    pub fn trigger(&self, args: A) {
        let _notify = scopeguard::guard((), |()| self.notify_fired());

        let invoked = {
            let _triggering = self.triggering.enter("trigger");
            dispatch(&self.registry, &args)
        };

        tracing::trace!(emitter = %self.name, invoked, "trigger pass completed");
    }

    /// Blocks until the emitter is triggered or `timeout` elapses. `None` waits forever.
    ///
    /// Returns `true` if the emitter was triggered.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a handler that this emitter is currently invoking on the
    /// same thread.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        self.wait_with(|_| {}, timeout)
    }

    /// Subscribes `handler` for the next trigger and blocks until it has been invoked or
    /// `timeout` elapses. `None` waits forever.
    ///
    /// Returns `true` if the handler was invoked. On timeout the handler is removed again and
    /// `false` is returned. If the handler already started running on the triggering thread
    /// when the timeout expired, that invocation is not cancelled. The wait also returns `false`
    /// when [`remove_all()`][Self::remove_all] removes the handler before it fires.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a handler that this emitter is currently invoking on the
    /// same thread.
    pub fn wait_with<F>(&self, handler: F, timeout: Option<Duration>) -> bool
    where
        F: FnOnce(&A) + Send + 'static,
    {
        self.assert_outside_trigger("wait", "use async_wait() instead");

        let ticket = self.subscribe_wait(handler);
        self.complete_wait(ticket, timeout)
    }

    /// Subscribes `handler` for the next trigger and returns immediately. If the emitter is not
    /// triggered within `timeout`, the handler is removed and `on_timeout` is invoked instead.
    ///
    /// The subscription is made before this method returns, so a trigger that follows the call
    /// is always observed. The wait itself takes place on a task of the emitter's [`Executor`].
    /// If that task cannot be started, the subscription is withdrawn and neither callback runs.
    pub fn async_wait<F, T>(self: &Arc<Self>, handler: F, timeout: Duration, on_timeout: T)
    where
        A: 'static,
        F: FnOnce(&A) + Send + 'static,
        T: FnOnce() + Send + 'static,
    {
        let ticket = self.subscribe_wait(handler);
        let handle = ticket.handle;
        let emitter = Arc::clone(self);

        let started = spawn_detached(&*self.executor, &self.name, move || {
            if !emitter.complete_wait(ticket, Some(timeout)) {
                on_timeout();
            }
        });

        if !started {
            self.remove(handle);
        }
    }

    /// Returns the arguments of the next trigger as a [`NextEvent`], which can be received
    /// synchronously or awaited.
    pub fn future_once(&self) -> NextEvent<A>
    where
        A: Clone + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();

        self.once(move |args: &A| {
            // The receiver may have been dropped already, which is fine.
            drop(sender.send(args.clone()));
        });

        NextEvent::new(receiver)
    }

    /// Subscribes a handler that runs on a task of the emitter's [`Executor`] for every
    /// trigger, with a clone of the arguments.
    ///
    /// The trigger does not wait for the handler. Panics raised by the handler are caught and
    /// logged.
    pub fn async_on<F>(&self, handler: F) -> Handle
    where
        A: Clone + Send + 'static,
        F: Fn(&A) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let executor = Arc::clone(&self.executor);
        let name = Arc::clone(&self.name);

        self.on(move |args: &A| {
            let handler = Arc::clone(&handler);
            let args = args.clone();
            spawn_detached(&*executor, &name, move || handler(&args));
        })
    }

    /// Subscribes a handler that runs on a task of the emitter's [`Executor`] for the next
    /// trigger only, with a clone of the arguments.
    pub fn async_once<F>(&self, handler: F) -> Handle
    where
        A: Clone + Send + 'static,
        F: FnOnce(&A) + Send + 'static,
    {
        let executor = Arc::clone(&self.executor);
        let name = Arc::clone(&self.name);

        self.once(move |args: &A| {
            let args = args.clone();
            spawn_detached(&*executor, &name, move || handler(&args));
        })
    }

    /// Records a trigger with arguments captured now. It runs when the deferred queue is
    /// drained.
    pub fn defer(&self, args: A)
    where
        A: Send + 'static,
    {
        self.deferred
            .enqueue(move |emitter: &Self| emitter.trigger(args));
        tracing::trace!(emitter = %self.name, "deferred trigger enqueued");
    }

    /// Records a trigger whose arguments are produced by `producer` when the deferred queue is
    /// drained.
    pub fn defer_with<F>(&self, producer: F)
    where
        F: FnOnce() -> A + Send + 'static,
    {
        self.deferred
            .enqueue(move |emitter: &Self| emitter.trigger(producer()));
        tracing::trace!(emitter = %self.name, "deferred trigger enqueued");
    }

    /// Runs the oldest deferred trigger, if any, on the calling thread. Returns whether more
    /// deferred triggers are pending.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a handler that this emitter is currently invoking on the
    /// same thread, whether the pass was started by a trigger or by a drain.
    pub fn drain_one(&self) -> bool {
        self.assert_outside_trigger("drain", "drain from outside the handler instead");
        self.deferred.drain_one(self)
    }

    /// Runs deferred triggers on the calling thread until none are pending and returns how many
    /// ran.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a handler that this emitter is currently invoking on the
    /// same thread, whether the pass was started by a trigger or by a drain.
    pub fn drain_all(&self) -> usize {
        self.assert_outside_trigger("drain", "drain from outside the handler instead");
        let executed = self.deferred.drain_all(self);
        tracing::trace!(emitter = %self.name, executed, "drained deferred triggers");
        executed
    }

    /// Discards all pending deferred triggers and returns how many were discarded.
    pub fn clear_deferred(&self) -> usize {
        let discarded = self.deferred.clear();
        tracing::debug!(emitter = %self.name, discarded, "discarded deferred triggers");
        discarded
    }

    /// The number of pending deferred triggers.
    #[must_use]
    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    /// The name recorded in log records of this emitter.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The order in which trigger passes visit handlers.
    #[must_use]
    pub fn dispatch_order(&self) -> DispatchOrder {
        self.registry.with_registry(|registry| registry.order())
    }

    // A pass running on this thread excludes every drain and wait of this emitter.
    fn assert_outside_trigger(&self, operation: &str, advice: &str) {
        assert!(
            !self.triggering.is_held_by_current_thread(),
            "{operation} was called from inside a handler that is already running under the \
             same emitter's trigger - this would deadlock; {advice}"
        );
    }

    fn subscribe(&self, callback: Callback<A>, once: bool) -> Handle {
        let handle = self
            .registry
            .with_registry(|registry| registry.insert(callback, once));
        tracing::trace!(emitter = %self.name, %handle, "handler subscribed");
        handle
    }

    fn subscribe_wait<F>(&self, handler: F) -> WaitTicket
    where
        F: FnOnce(&A) + Send + 'static,
    {
        let fired = Arc::new(AtomicBool::new(false));

        let handle = self.once({
            let fired = Arc::clone(&fired);
            move |args: &A| {
                // Also set if the handler panics; the event did fire.
                let _fired = scopeguard::guard((), |()| fired.store(true, Ordering::Release));
                handler(args);
            }
        });

        WaitTicket { handle, fired }
    }

    #[cfg_attr(test, mutants::skip)] // Timing-dependent, mutations cause hangs.
    fn complete_wait(&self, ticket: WaitTicket, timeout: Option<Duration>) -> bool {
        let WaitTicket { handle, fired } = ticket;

        // Also stops waiting if the handler disappears without firing, e.g. via remove_all().
        let waiting = |registry: &mut HandlerRegistry<Callback<A>>| {
            !fired.load(Ordering::Acquire) && registry.contains(handle)
        };

        let registry = self.registry.lock().expect(ERR_POISONED_LOCK);

        match timeout {
            None => {
                drop(self.fired.wait_while(registry, waiting).expect(ERR_POISONED_LOCK));
            }
            Some(timeout) => {
                let (mut registry, result) = self
                    .fired
                    .wait_timeout_while(registry, timeout, waiting)
                    .expect(ERR_POISONED_LOCK);

                if result.timed_out() {
                    registry.remove(handle);
                }
            }
        }

        let completed = fired.load(Ordering::Acquire);

        if !completed {
            tracing::debug!(
                emitter = %self.name,
                ?timeout,
                %handle,
                "wait ended without the event firing"
            );
        }

        completed
    }

    fn notify_fired(&self) {
        // Waiters check their flag under the registry lock, so taking it here orders the
        // notification after any waiter that is about to block.
        let _registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        self.fired.notify_all();
    }
}

impl<A> Default for Emitter<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Emit<A> for Emitter<A> {
    fn emit(&self, args: A) {
        self.trigger(args);
    }
}

impl<A> fmt::Debug for Emitter<A> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("name", &self.name)
            .field("registry", &self.registry)
            .field("triggering", &self.triggering)
            .field("deferred", &self.deferred)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}
