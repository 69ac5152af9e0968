use std::fmt;

/// Identifies one subscription on an emitter.
///
/// A handle is returned by every subscription method and its only purpose is to remove that
/// subscription later. Handles are plain values: they stay valid and comparable after the
/// subscription they refer to is gone, so removing the same handle twice is harmless and simply
/// reports that nothing was found the second time.
///
/// Handles are only meaningful for the emitter (or, for keyed dispatchers, the key) that issued
/// them.
///
/// # Example
///
/// ```rust
/// use emitter::LocalEmitter;
///
/// let emitter = LocalEmitter::<u32>::new();
/// let handle = emitter.on(|value| println!("got {value}"));
///
/// assert!(emitter.remove(handle));
/// assert!(!emitter.remove(handle));
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Handle {
    id: u64,
    once: bool,
}

impl Handle {
    pub(crate) fn new(id: u64, once: bool) -> Self {
        Self { id, once }
    }

    pub(crate) fn id(self) -> u64 {
        self.id
    }

    /// Whether the subscription was made with one of the `once` methods and is therefore
    /// removed automatically after its first invocation.
    #[must_use]
    pub fn is_once(self) -> bool {
        self.once
    }
}

impl fmt::Display for Handle {
    #[cfg_attr(test, mutants::skip)] // No API contract for the display format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.once {
            write!(f, "handler #{} (once)", self.id)
        } else {
            write!(f, "handler #{}", self.id)
        }
    }
}
