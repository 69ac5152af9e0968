use std::marker::PhantomData;
use std::sync::Arc;

use crate::{DEFAULT_NAME, DispatchOrder, LocalEmitter};

/// Builder for creating an instance of [`LocalEmitter`].
///
/// All settings are optional; `LocalEmitter::new()` is equivalent to building with defaults.
///
/// # Example
///
/// ```rust
/// use emitter::{DispatchOrder, LocalEmitter};
///
/// let emitter = LocalEmitter::<u32>::builder()
///     .name("config_reloaded")
///     .dispatch_order(DispatchOrder::OldestFirst)
///     .build();
///
/// assert_eq!(emitter.name(), "config_reloaded");
/// ```
#[derive(Debug)]
#[must_use]
pub struct LocalEmitterBuilder<A> {
    name: Arc<str>,
    dispatch_order: DispatchOrder,

    _args: PhantomData<fn(&A)>,
}

impl<A> LocalEmitterBuilder<A> {
    pub(crate) fn new() -> Self {
        Self {
            name: Arc::from(DEFAULT_NAME),
            dispatch_order: DispatchOrder::default(),
            _args: PhantomData,
        }
    }

    /// Sets the name recorded in log records of the emitter.
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the order in which a trigger pass visits handlers.
    ///
    /// The default is [`DispatchOrder::NewestFirst`].
    pub fn dispatch_order(mut self, dispatch_order: DispatchOrder) -> Self {
        self.dispatch_order = dispatch_order;
        self
    }

    /// Builds the emitter.
    #[must_use]
    pub fn build(self) -> LocalEmitter<A> {
        LocalEmitter::from_parts(self.name, self.dispatch_order)
    }
}
