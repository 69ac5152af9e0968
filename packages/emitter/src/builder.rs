use std::marker::PhantomData;
use std::sync::Arc;

use crate::{DEFAULT_NAME, DispatchOrder, Emitter, Executor, ThreadExecutor};

/// Builder for creating an instance of [`Emitter`].
///
/// All settings are optional; `Emitter::new()` is equivalent to building with defaults.
///
/// # Example
///
/// ```rust
/// use emitter::{DispatchOrder, Emitter, ThreadExecutor};
///
/// let emitter = Emitter::<u64>::builder()
///     .name("bytes_received")
///     .dispatch_order(DispatchOrder::OldestFirst)
///     .executor(ThreadExecutor::with_thread_name("bytes-received-handler"))
///     .build();
///
/// assert_eq!(emitter.name(), "bytes_received");
/// ```
#[derive(Debug)]
#[must_use]
pub struct EmitterBuilder<A> {
    name: Arc<str>,
    dispatch_order: DispatchOrder,
    executor: Option<Arc<dyn Executor>>,

    _args: PhantomData<fn(&A)>,
}

impl<A> EmitterBuilder<A> {
    pub(crate) fn new() -> Self {
        Self {
            name: Arc::from(DEFAULT_NAME),
            dispatch_order: DispatchOrder::default(),
            executor: None,
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

    /// Sets the executor that runs asynchronous handlers and asynchronous waits.
    ///
    /// The default is a [`ThreadExecutor`] without thread names.
    pub fn executor(mut self, executor: impl Executor + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Sets an executor that is shared with other emitters.
    pub fn shared_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Builds the emitter.
    #[must_use]
    pub fn build(self) -> Emitter<A> {
        let executor = self
            .executor
            .unwrap_or_else(|| Arc::new(ThreadExecutor::new()));

        Emitter::from_parts(self.name, self.dispatch_order, executor)
    }
}
