//! Execution of a trigger pass over a registry.

use crate::RegistryAccess;

/// The order in which a trigger pass visits the live handlers of an emitter.
///
/// Once-handlers and keyed dispatch rely on a defined order, so every emitter fixes one at
/// construction time.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum DispatchOrder {
    /// The most recently subscribed handler is invoked first.
    #[default]
    NewestFirst,

    /// Handlers are invoked in the order they were subscribed.
    OldestFirst,
}

/// Runs one trigger pass and returns the number of handlers invoked.
///
/// The set of candidates is captured when the pass starts; handlers subscribed by a handler
/// during the pass are not visited. Before each invocation the handler's callback is checked out
/// of the registry and the registry access is released, so handlers may subscribe, remove or
/// query through the same owner. A handler removed before its turn is skipped.
///
/// If a handler panics, its callback is still returned to the registry (or discarded, for
/// once-handlers) while the panic unwinds to the caller.
pub(crate) fn dispatch<R, A>(registry: &R, args: &A) -> usize
where
    R: RegistryAccess + ?Sized,
    R::Callback: FnMut(&A),
{
    let pass = registry.with_registry(|registry| registry.pass());
    let mut invoked: usize = 0;

    for id in pass {
        let Some(callback) = registry.with_registry(|registry| registry.begin_firing(id)) else {
            continue;
        };

        let mut callback = scopeguard::guard(callback, |callback| {
            registry.with_registry(|registry| registry.finish_firing(id, callback));
        });

        let handler: &mut R::Callback = &mut callback;
        handler(args);

        invoked = invoked.saturating_add(1);
    }

    invoked
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    use super::*;
    use crate::HandlerRegistry;

    type Callback = Box<dyn FnMut(&u32)>;
    type Log = Rc<RefCell<Vec<String>>>;

    fn fail(_: &u32) {
        panic!("handler failure");
    }

    fn logger(log: &Log, label: &'static str) -> Callback {
        let log = Rc::clone(log);
        Box::new(move |value: &u32| log.borrow_mut().push(format!("{label}{value}")))
    }

    #[test]
    fn empty_registry_invokes_nothing() {
        let registry = RefCell::new(HandlerRegistry::<Callback>::new(DispatchOrder::default()));

        assert_eq!(dispatch(&registry, &1_u32), 0);
    }

    #[test]
    fn visits_newest_first() {
        let log = Log::default();
        let registry = RefCell::new(HandlerRegistry::new(DispatchOrder::NewestFirst));
        registry.with_registry(|r| {
            r.insert(logger(&log, "h1:"), false);
            r.insert(logger(&log, "h2:"), false);
            r.insert(logger(&log, "h3:"), false);
        });

        assert_eq!(dispatch(&registry, &7_u32), 3);
        assert_eq!(*log.borrow(), ["h3:7", "h2:7", "h1:7"]);
    }

    #[test]
    fn visits_oldest_first_when_configured() {
        let log = Log::default();
        let registry = RefCell::new(HandlerRegistry::new(DispatchOrder::OldestFirst));
        registry.with_registry(|r| {
            r.insert(logger(&log, "h1:"), false);
            r.insert(logger(&log, "h2:"), false);
        });

        dispatch(&registry, &0_u32);
        assert_eq!(*log.borrow(), ["h1:0", "h2:0"]);
    }

    #[test]
    fn once_handler_runs_in_one_pass_only() {
        let log = Log::default();
        let registry = RefCell::new(HandlerRegistry::new(DispatchOrder::default()));
        registry.with_registry(|r| r.insert(logger(&log, "once:"), true));

        assert_eq!(dispatch(&registry, &1_u32), 1);
        assert_eq!(dispatch(&registry, &2_u32), 0);
        assert_eq!(*log.borrow(), ["once:1"]);
        assert!(registry.with_registry(|r| r.is_empty()));
    }

    #[test]
    fn panicking_handler_stays_registered() {
        let registry = RefCell::new(HandlerRegistry::<Callback>::new(DispatchOrder::default()));
        registry.with_registry(|r| {
            r.insert(Box::new(fail), false);
        });

        let result = panic::catch_unwind(AssertUnwindSafe(|| dispatch(&registry, &1_u32)));
        assert!(result.is_err());

        // The callback was checked back in during unwinding, so it fires (and fails) again.
        assert_eq!(registry.with_registry(|r| r.len()), 1);
        let result = panic::catch_unwind(AssertUnwindSafe(|| dispatch(&registry, &1_u32)));
        assert!(result.is_err());
    }

    #[test]
    fn panicking_once_handler_is_removed() {
        let registry = RefCell::new(HandlerRegistry::<Callback>::new(DispatchOrder::default()));
        registry.with_registry(|r| {
            r.insert(Box::new(fail), true);
        });

        let result = panic::catch_unwind(AssertUnwindSafe(|| dispatch(&registry, &1_u32)));
        assert!(result.is_err());
        assert!(registry.with_registry(|r| r.is_empty()));
    }
}
