use std::borrow::Borrow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::{DispatchOrder, Emit, Handle, HandlerRegistry, RegistryAccess, dispatch};

type Callback<A> = Box<dyn FnMut(&A)>;
type Routes<K, A> = HashMap<K, HandlerRegistry<Callback<A>>>;

/// A single-owner dispatcher that keeps an independent set of handlers per key.
///
/// Every key behaves like its own [`LocalEmitter`][crate::LocalEmitter]: triggering a key
/// invokes only the handlers subscribed under that key, once-handlers and removal are scoped to
/// the key, and handlers may call back into the dispatcher while they run. A key that nobody
/// subscribed to behaves like an emitter without handlers.
///
/// A [`Handle`] is only meaningful together with the key it was issued for.
///
/// Wrap the dispatcher in [`Deferred`][crate::Deferred] to defer keyed triggers; it implements
/// [`Emit<(K, A)>`][Emit] for that purpose.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use emitter::KeyedDispatcher;
///
/// let dispatcher = KeyedDispatcher::<String, u32>::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// dispatcher.on("opened", {
///     let log = Rc::clone(&log);
///     move |id| log.borrow_mut().push(format!("opened {id}"))
/// });
/// dispatcher.on("closed", {
///     let log = Rc::clone(&log);
///     move |id| log.borrow_mut().push(format!("closed {id}"))
/// });
///
/// dispatcher.trigger("opened", 1);
/// dispatcher.trigger("resized", 1);
///
/// assert_eq!(*log.borrow(), ["opened 1"]);
/// ```
pub struct KeyedDispatcher<K, A> {
    // Registries are never removed, so handle ids under a key are never reissued.
    routes: RefCell<Routes<K, A>>,
    dispatch_order: DispatchOrder,
}

impl<K, A> KeyedDispatcher<K, A>
where
    K: Eq + Hash,
{
    /// Creates a dispatcher whose keys visit the newest handler first.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dispatch_order(DispatchOrder::default())
    }

    /// Creates a dispatcher whose keys visit handlers in `dispatch_order`.
    #[must_use]
    pub fn with_dispatch_order(dispatch_order: DispatchOrder) -> Self {
        Self {
            routes: RefCell::new(HashMap::new()),
            dispatch_order,
        }
    }

    /// Subscribes a handler under `key` that is invoked on every trigger of that key.
    pub fn on<F>(&self, key: impl Into<K>, handler: F) -> Handle
    where
        F: FnMut(&A) + 'static,
    {
        self.subscribe(key.into(), Box::new(handler), false)
    }

    /// Subscribes a handler under `key` that is invoked on the next trigger of that key only.
    pub fn once<F>(&self, key: impl Into<K>, handler: F) -> Handle
    where
        F: FnOnce(&A) + 'static,
    {
        let mut handler = Some(handler);

        self.subscribe(
            key.into(),
            Box::new(move |args: &A| {
                if let Some(handler) = handler.take() {
                    handler(args);
                }
            }),
            true,
        )
    }

    /// Removes a handler subscribed under `key`. Returns `false` if no live handler matched.
    pub fn remove<Q>(&self, key: &Q, handle: Handle) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.route(key)
            .with_registry(|registry| registry.remove(handle))
    }

    /// Removes every handler subscribed under `key`.
    pub fn remove_all<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.route(key).with_registry(HandlerRegistry::clear);
    }

    /// Removes every handler under every key.
    pub fn clear(&self) {
        for registry in self.routes.borrow_mut().values_mut() {
            registry.clear();
        }

        tracing::trace!("all keyed handlers removed");
    }

    /// The number of live handlers subscribed under `key`.
    #[must_use]
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.route(key).with_registry(|registry| registry.len())
    }

    /// Whether any handler is subscribed under `key`.
    #[must_use]
    pub fn has_any<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        !self.route(key).with_registry(|registry| registry.is_empty())
    }

    /// Invokes the handlers subscribed under `key` with a reference to `args`.
    ///
    /// Handlers under other keys are not invoked. Triggering a key without handlers does
    /// nothing.
    pub fn trigger<Q>(&self, key: &Q, args: A)
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let invoked = dispatch(&self.route(key), &args);
        tracing::trace!(invoked, "keyed trigger pass completed");
    }

    /// The order in which trigger passes visit handlers.
    #[must_use]
    pub fn dispatch_order(&self) -> DispatchOrder {
        self.dispatch_order
    }

    fn subscribe(&self, key: K, callback: Callback<A>, once: bool) -> Handle {
        let handle = self
            .routes
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| HandlerRegistry::new(self.dispatch_order))
            .insert(callback, once);

        tracing::trace!(%handle, "keyed handler subscribed");
        handle
    }

    fn route<'a, Q>(&'a self, key: &'a Q) -> Route<'a, K, Q, A>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        Route {
            routes: &self.routes,
            key,
            dispatch_order: self.dispatch_order,
        }
    }
}

impl<K, A> Default for KeyedDispatcher<K, A>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A> Emit<(K, A)> for KeyedDispatcher<K, A>
where
    K: Eq + Hash,
{
    fn emit(&self, (key, args): (K, A)) {
        self.trigger(&key, args);
    }
}

impl<K, A> fmt::Debug for KeyedDispatcher<K, A> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedDispatcher")
            .field("keys", &self.routes.borrow().len())
            .field("dispatch_order", &self.dispatch_order)
            .finish_non_exhaustive()
    }
}

/// The registry of one key, looked up anew on every access.
///
/// A key without a registry is served by a temporary empty one, so looking up or triggering an
/// unknown key never creates an entry.
struct Route<'a, K, Q: ?Sized, A> {
    routes: &'a RefCell<Routes<K, A>>,
    key: &'a Q,
    dispatch_order: DispatchOrder,
}

impl<K, Q, A> RegistryAccess for Route<'_, K, Q, A>
where
    K: Eq + Hash + Borrow<Q>,
    Q: Eq + Hash + ?Sized,
{
    type Callback = Callback<A>;

    fn with_registry<R>(&self, f: impl FnOnce(&mut HandlerRegistry<Callback<A>>) -> R) -> R {
        let mut routes = self.routes.borrow_mut();

        match routes.get_mut(self.key) {
            Some(registry) => f(registry),
            None => f(&mut HandlerRegistry::new(self.dispatch_order)),
        }
    }
}
