use std::io;

use thiserror::Error;

/// Errors reported by the emitter package.
///
/// Most emitter operations cannot fail: removing an unknown handle reports `false` and a wait
/// that times out reports `false`. The variants here cover the few places where a value is
/// expected but cannot be produced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The handler that was supposed to deliver the value was removed before the event fired,
    /// for example by `remove_all()` or because the emitter was dropped.
    #[error("the event handler was removed before the event fired")]
    Disconnected,

    /// No event fired within the allotted time.
    #[error("timed out waiting for the event to fire")]
    Timeout,

    /// An [`Executor`][crate::Executor] failed to start a task for an asynchronous handler.
    #[error("failed to start a task for an asynchronous handler")]
    Spawn(#[source] io::Error),
}

/// A specialized `Result` type for emitter operations, returning the package's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
