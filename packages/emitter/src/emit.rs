/// The capability shared by everything that can run a trigger pass for arguments of type `A`.
///
/// Decorators such as [`Deferred`][crate::Deferred] are written against this trait rather than
/// against a concrete emitter, so the same decorator works for [`LocalEmitter`][crate::LocalEmitter],
/// [`Emitter`][crate::Emitter] and [`KeyedDispatcher`][crate::KeyedDispatcher] alike.
///
/// # Example
///
/// ```rust
/// use emitter::{Emit, LocalEmitter};
///
/// fn announce(target: &impl Emit<String>) {
///     target.emit("ready".to_string());
/// }
///
/// let emitter = LocalEmitter::<String>::new();
/// emitter.on(|message| assert_eq!(message, "ready"));
/// announce(&emitter);
/// ```
pub trait Emit<A> {
    /// Runs a trigger pass with `args`, or whatever "triggering" means for the implementation
    /// (a deferring decorator enqueues the pass instead of running it).
    fn emit(&self, args: A);
}
