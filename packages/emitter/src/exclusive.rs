//! Serialization of long-running operations that run user code.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// A lock held for the whole duration of an operation that invokes handlers, such as a trigger
/// pass or a deferred drain.
///
/// Handlers run while the section is held, so a handler that tries to enter the same section
/// again from the same thread would wait for itself forever. The section remembers which thread
/// holds it and turns that situation into a panic with a descriptive message instead.
///
/// The lock protects no data, so poisoning (a handler panicked while the section was held) is
/// ignored.
#[derive(Debug, Default)]
pub(crate) struct ExclusiveSection {
    lock: Mutex<()>,
    holder: Mutex<Option<ThreadId>>,
}

impl ExclusiveSection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Waits until no other thread is inside the section and enters it.
    ///
    /// # Panics
    ///
    /// Panics if the current thread is already inside the section.
    pub(crate) fn enter(&self, operation: &'static str) -> SectionGuard<'_> {
        assert!(
            !self.is_held_by_current_thread(),
            "{operation} was called from inside a handler that is already running under the same \
             emitter's {operation} - this would deadlock; subscribe the handler with async_on() \
             or defer the work instead"
        );

        let lock = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        *self.holder() = Some(thread::current().id());

        SectionGuard {
            section: self,
            _lock: lock,
        }
    }

    pub(crate) fn is_held_by_current_thread(&self) -> bool {
        *self.holder() == Some(thread::current().id())
    }

    fn holder(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.holder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps an [`ExclusiveSection`] entered until dropped.
#[derive(Debug)]
pub(crate) struct SectionGuard<'a> {
    section: &'a ExclusiveSection,
    _lock: MutexGuard<'a, ()>,
}

impl Drop for SectionGuard<'_> {
    fn drop(&mut self) {
        // Runs before `_lock` is released, so the next holder never observes a stale value.
        *self.section.holder() = None;
    }
}
