use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::sync::Mutex;

use crate::{ERR_POISONED_LOCK, ExclusiveSection};

type Task<E> = Box<dyn FnOnce(&E) + Send>;

/// A thread-safe FIFO of deferred tasks, each of which runs against a target of type `E`.
///
/// Any thread may enqueue tasks and any thread may drain them. Tasks always run in the order
/// they were enqueued, on the thread that drains them. Drains are serialized: while one thread
/// is running a task, another thread that wants to drain waits for it, so tasks never overlap
/// even when several threads pump the same queue.
///
/// The queue itself is not locked while a task runs, so tasks may enqueue further tasks.
/// A task that tries to drain the queue it is running from panics, because that drain would
/// wait for itself forever.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
///
/// use emitter::{DeferredQueue, Emitter};
///
/// let emitter = Emitter::<u32>::new();
/// let queue = Arc::new(DeferredQueue::new());
///
/// let producer = thread::spawn({
///     let queue = Arc::clone(&queue);
///     move || queue.enqueue(|emitter: &Emitter<u32>| emitter.trigger(1))
/// });
/// producer.join().unwrap();
///
/// assert_eq!(queue.drain_all(&emitter), 1);
/// ```
pub struct DeferredQueue<E> {
    tasks: Mutex<VecDeque<Task<E>>>,
    draining: ExclusiveSection,
}

impl<E> DeferredQueue<E> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
            draining: ExclusiveSection::new(),
        }
    }

    /// Appends a task to the tail of the queue.
    pub fn enqueue(&self, task: impl FnOnce(&E) + Send + 'static) {
        self.tasks
            .lock()
            .expect(ERR_POISONED_LOCK)
            .push_back(Box::new(task));
    }

    /// Runs the task at the head of the queue, if any.
    ///
    /// Returns whether the queue still holds tasks afterwards.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a task that is being drained from this queue.
    pub fn drain_one(&self, target: &E) -> bool {
        {
            let _draining = self.draining.enter("drain");

            if let Some(task) = self.pop() {
                task(target);
            }
        }

        !self.is_empty()
    }

    /// Runs tasks until the queue is empty and returns how many ran.
    ///
    /// Tasks enqueued while draining, by the tasks themselves or by other threads, are run by
    /// the same call.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a task that is being drained from this queue.
    pub fn drain_all(&self, target: &E) -> usize {
        let _draining = self.draining.enter("drain");
        let mut executed: usize = 0;

        while let Some(task) = self.pop() {
            task(target);
            executed = executed.saturating_add(1);
        }

        executed
    }

    /// Discards all pending tasks without running them and returns how many were discarded.
    ///
    /// A task that is already running is not affected.
    pub fn clear(&self) -> usize {
        let discarded = mem::take(&mut *self.tasks.lock().expect(ERR_POISONED_LOCK));

        // Dropped after the lock is released.
        discarded.len()
    }

    /// The number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().expect(ERR_POISONED_LOCK).len()
    }

    /// Whether no tasks are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().expect(ERR_POISONED_LOCK).is_empty()
    }

    fn pop(&self) -> Option<Task<E>> {
        self.tasks.lock().expect(ERR_POISONED_LOCK).pop_front()
    }
}

impl<E> Default for DeferredQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for DeferredQueue<E> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredQueue")
            .field("len", &self.len())
            .field("draining", &self.draining)
            .finish()
    }
}
