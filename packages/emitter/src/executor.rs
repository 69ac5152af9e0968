//! Off-thread execution of asynchronous handlers.

use std::any::Any;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use crate::{Error, Result};

/// Starts tasks for handlers subscribed with [`Emitter::async_on()`][crate::Emitter::async_on],
/// [`Emitter::async_once()`][crate::Emitter::async_once] and for
/// [`Emitter::async_wait()`][crate::Emitter::async_wait].
///
/// The emitter does not wait for the tasks it hands over. Panics inside tasks are caught and
/// logged by the emitter before the task reaches the executor, so implementations do not need to
/// guard against them.
pub trait Executor: Debug + Send + Sync {
    /// Starts `task` on some thread other than the caller's.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the task could not be started. The task is dropped without
    /// running in that case.
    fn spawn(&self, task: Box<dyn FnOnce() + Send>) -> Result<()>;
}

/// An [`Executor`] that runs every task on a new, detached OS thread.
///
/// This is the default executor of [`Emitter`][crate::Emitter]. It has no limit on the number of
/// concurrently running tasks, so it suits emitters with infrequent asynchronous handlers. Supply
/// a pooled executor through [`EmitterBuilder::executor()`][crate::EmitterBuilder::executor] for
/// anything busier.
#[derive(Clone, Debug, Default)]
pub struct ThreadExecutor {
    thread_name: Option<String>,
}

impl ThreadExecutor {
    /// Creates an executor whose threads have no name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor that assigns `name` to every thread it starts.
    #[must_use]
    pub fn with_thread_name(name: impl Into<String>) -> Self {
        Self {
            thread_name: Some(name.into()),
        }
    }
}

impl Executor for ThreadExecutor {
    fn spawn(&self, task: Box<dyn FnOnce() + Send>) -> Result<()> {
        let mut builder = thread::Builder::new();

        if let Some(name) = &self.thread_name {
            builder = builder.name(name.clone());
        }

        // The join handle is dropped, detaching the thread.
        builder.spawn(task).map(drop).map_err(Error::Spawn)
    }
}

/// Hands `task` to `executor`, logging instead of propagating both panics and spawn failures.
///
/// Asynchronous handlers have no caller to report to, so the log is the only place where their
/// failures become visible. Returns whether the task was started.
pub(crate) fn spawn_detached<F>(executor: &dyn Executor, emitter: &Arc<str>, task: F) -> bool
where
    F: FnOnce() + Send + 'static,
{
    let name = Arc::clone(emitter);
    let task = Box::new(move || {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            let message = format_panic_payload(&payload);
            tracing::error!(
                emitter = %name,
                panic_message = %message,
                "asynchronous handler panicked"
            );
        }
    });

    match executor.spawn(task) {
        Ok(()) => true,
        Err(error) => {
            tracing::error!(
                emitter = %emitter,
                error = %error,
                "failed to start asynchronous handler, the invocation is dropped"
            );
            false
        }
    }
}

fn format_panic_payload(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
