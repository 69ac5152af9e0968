use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use oneshot::{RecvError, RecvTimeoutError, TryRecvError};

use crate::{Error, Result};

/// The arguments of the next trigger of an [`Emitter`][crate::Emitter], obtained from
/// [`Emitter::future_once()`][crate::Emitter::future_once].
///
/// The value can be consumed synchronously with [`recv()`][Self::recv] and its variants or by
/// awaiting the `NextEvent` itself. It is fulfilled at most once.
///
/// If the internal handler that fulfils the value is removed before the emitter fires (for
/// example by [`Emitter::remove_all()`][crate::Emitter::remove_all] or by dropping the emitter),
/// the value resolves to [`Error::Disconnected`].
///
/// # Example
///
/// ```rust
/// use emitter::Emitter;
///
/// let emitter = Emitter::<(u32, String)>::new();
/// let next = emitter.future_once();
///
/// emitter.trigger((7, "seven".to_string()));
///
/// assert_eq!(next.recv().unwrap(), (7, "seven".to_string()));
/// ```
pub struct NextEvent<A> {
    receiver: oneshot::Receiver<A>,
}

impl<A> NextEvent<A> {
    pub(crate) fn new(receiver: oneshot::Receiver<A>) -> Self {
        Self { receiver }
    }

    /// Blocks the current thread until the emitter fires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Disconnected`] if the value can no longer be delivered.
    pub fn recv(self) -> Result<A> {
        self.receiver.recv().map_err(|RecvError| Error::Disconnected)
    }

    /// Blocks the current thread until the emitter fires or `timeout` elapses.
    ///
    /// A timeout does not consume the `NextEvent`; it can be received again later.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if nothing fired in time and [`Error::Disconnected`] if the
    /// value can no longer be delivered.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<A> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => Error::Timeout,
            RecvTimeoutError::Disconnected => Error::Disconnected,
        })
    }

    /// Returns the value if the emitter has already fired, without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Disconnected`] if the value can no longer be delivered.
    pub fn try_recv(&self) -> Result<Option<A>> {
        match self.receiver.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::Disconnected),
        }
    }
}

impl<A> Future for NextEvent<A> {
    type Output = Result<A>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // SAFETY: The receiver is never moved out of `self`, we only poll it in place.
        let receiver = unsafe { self.map_unchecked_mut(|this| &mut this.receiver) };

        receiver
            .poll(cx)
            .map(|result| result.map_err(|RecvError| Error::Disconnected))
    }
}

impl<A> fmt::Debug for NextEvent<A> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NextEvent")
            .field("value_type", &type_name::<A>())
            .finish_non_exhaustive()
    }
}
