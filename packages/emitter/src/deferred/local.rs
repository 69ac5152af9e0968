use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

type Task<E> = Box<dyn FnOnce(&E)>;

/// A single-owner FIFO of deferred tasks, each of which runs against a target of type `E`.
///
/// The queue is usually owned by the target itself (see [`Deferred`][crate::Deferred]), so the
/// target is passed to the drain methods instead of being captured by every task.
///
/// Tasks may enqueue further tasks while they run. [`drain_all()`][Self::drain_all] picks those
/// up in the same call.
///
/// # Example
///
/// ```rust
/// use emitter::{LocalDeferredQueue, LocalEmitter};
///
/// let emitter = LocalEmitter::<u32>::new();
/// let queue = LocalDeferredQueue::new();
///
/// queue.enqueue(|emitter: &LocalEmitter<u32>| emitter.trigger(1));
/// queue.enqueue(|emitter: &LocalEmitter<u32>| emitter.trigger(2));
///
/// assert_eq!(queue.drain_all(&emitter), 2);
/// ```
pub struct LocalDeferredQueue<E> {
    tasks: RefCell<VecDeque<Task<E>>>,
}

impl<E> LocalDeferredQueue<E> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: RefCell::new(VecDeque::new()),
        }
    }

    /// Appends a task to the tail of the queue.
    pub fn enqueue(&self, task: impl FnOnce(&E) + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Runs the task at the head of the queue, if any.
    ///
    /// Returns whether the queue still holds tasks afterwards, including any that the executed
    /// task enqueued.
    pub fn drain_one(&self, target: &E) -> bool {
        // The borrow ends before the task runs, so the task may enqueue more work.
        let task = self.tasks.borrow_mut().pop_front();

        if let Some(task) = task {
            task(target);
        }

        !self.is_empty()
    }

    /// Runs tasks until the queue is empty and returns how many ran.
    pub fn drain_all(&self, target: &E) -> usize {
        let mut executed: usize = 0;

        loop {
            let task = self.tasks.borrow_mut().pop_front();
            let Some(task) = task else {
                return executed;
            };

            task(target);
            executed = executed.saturating_add(1);
        }
    }

    /// Discards all pending tasks without running them and returns how many were discarded.
    pub fn clear(&self) -> usize {
        // Taken out first because dropping a task may drop values that touch the queue.
        let discarded = self.tasks.take();
        discarded.len()
    }

    /// The number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Whether no tasks are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }
}

impl<E> Default for LocalDeferredQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for LocalDeferredQueue<E> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalDeferredQueue")
            .field("len", &self.len())
            .finish()
    }
}
