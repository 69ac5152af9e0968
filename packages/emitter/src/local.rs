use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use crate::{
    DEFAULT_NAME, DispatchOrder, Emit, Handle, HandlerRegistry, LocalEmitterBuilder, dispatch,
};

type Callback<A> = Box<dyn FnMut(&A)>;

/// A single-owner event emitter whose handlers receive a `&A` on every trigger.
///
/// This is the cooperative flavour of emitter: it is neither [`Send`] nor [`Sync`] and performs
/// no locking. Handlers may call back into the emitter while they run. They may subscribe more
/// handlers (which do not fire until the next trigger), remove themselves or other handlers
/// (which are then not invoked for the rest of the pass) and even trigger the emitter again. A
/// nested trigger skips handlers that are already running further up the stack.
///
/// Use [`Emitter`][crate::Emitter] when the emitter has to be shared between threads.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use emitter::LocalEmitter;
///
/// let emitter = LocalEmitter::<(u32, &'static str)>::new();
/// let total = Rc::new(Cell::new(0));
///
/// emitter.on({
///     let total = Rc::clone(&total);
///     move |(amount, _label)| total.set(total.get() + amount)
/// });
///
/// emitter.trigger((5, "first"));
/// emitter.trigger((7, "second"));
///
/// assert_eq!(total.get(), 12);
/// ```
pub struct LocalEmitter<A> {
    registry: RefCell<HandlerRegistry<Callback<A>>>,
    name: Arc<str>,
}

impl<A> LocalEmitter<A> {
    /// Creates an emitter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(Arc::from(DEFAULT_NAME), DispatchOrder::default())
    }

    /// Starts configuring a new emitter.
    pub fn builder() -> LocalEmitterBuilder<A> {
        LocalEmitterBuilder::new()
    }

    pub(crate) fn from_parts(name: Arc<str>, dispatch_order: DispatchOrder) -> Self {
        Self {
            registry: RefCell::new(HandlerRegistry::new(dispatch_order)),
            name,
        }
    }

    /// Subscribes a handler that is invoked on every trigger until it is removed.
    pub fn on<F>(&self, handler: F) -> Handle
    where
        F: FnMut(&A) + 'static,
    {
        let handle = self.registry.borrow_mut().insert(Box::new(handler), false);
        tracing::trace!(emitter = %self.name, %handle, "handler subscribed");
        handle
    }

    /// Subscribes a handler that is invoked on the next trigger only.
    ///
    /// The handler is removed in the same pass that invokes it, so it never observes a second
    /// trigger, not even a nested one raised by itself.
    pub fn once<F>(&self, handler: F) -> Handle
    where
        F: FnOnce(&A) + 'static,
    {
        let mut handler = Some(handler);
        let callback = move |args: &A| {
            if let Some(handler) = handler.take() {
                handler(args);
            }
        };

        let handle = self.registry.borrow_mut().insert(Box::new(callback), true);
        tracing::trace!(emitter = %self.name, %handle, "handler subscribed");
        handle
    }

    /// Removes a handler. Returns `false` if no live handler matched `handle`, for example
    /// because it was already removed or was a once-handler that already fired.
    pub fn remove(&self, handle: Handle) -> bool {
        let removed = self.registry.borrow_mut().remove(handle);
        tracing::trace!(emitter = %self.name, %handle, removed, "handler removal requested");
        removed
    }

    /// Removes every handler.
    ///
    /// Handlers that are running when this is called (because it is called from a handler)
    /// finish normally. No other handler of the current pass is invoked afterwards.
    pub fn remove_all(&self) {
        self.registry.borrow_mut().clear();
        tracing::trace!(emitter = %self.name, "all handlers removed");
    }

    /// The number of live handlers.
    #[must_use]
    pub fn count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Whether any handler is subscribed.
    #[must_use]
    pub fn has_any(&self) -> bool {
        !self.registry.borrow().is_empty()
    }

    /// Invokes every handler that is live when the call starts with a reference to `args`.
    ///
    /// # Panics
    ///
    /// A panic raised by a handler propagates to the caller. The emitter stays usable; handlers
    /// not visited before the panic are simply not invoked for this trigger.
    pub fn trigger(&self, args: A) {
        let invoked = dispatch(&self.registry, &args);
        tracing::trace!(emitter = %self.name, invoked, "trigger pass completed");
    }

    /// The name recorded in log records of this emitter.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The order in which trigger passes visit handlers.
    #[must_use]
    pub fn dispatch_order(&self) -> DispatchOrder {
        self.registry.borrow().order()
    }
}

impl<A> Default for LocalEmitter<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Emit<A> for LocalEmitter<A> {
    fn emit(&self, args: A) {
        self.trigger(args);
    }
}

impl<A> fmt::Debug for LocalEmitter<A> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEmitter")
            .field("name", &self.name)
            .field("registry", &self.registry)
            .finish()
    }
}
