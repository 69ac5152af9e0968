//! Ordered storage of subscribed handlers.
//!
//! The registry is a plain data structure without interior mutability. The emitters wrap it in
//! a `RefCell` (single-owner) or a `Mutex` (thread-safe) and reach it through [`RegistryAccess`],
//! which is the only interface the dispatcher depends on.
//!
//! Entries are kept in a `BTreeMap` keyed by handle id. Ids are issued in increasing order, so
//! the map order is the subscription order and a dispatch pass can walk it in either direction.
//! While a handler is being invoked its callback is checked out of the map and the entry is left
//! in the `Firing` state. Removing the entry in that state is allowed at any time: when the
//! invocation finishes and the entry is gone, the callback is simply dropped.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::mem;
use std::sync::Mutex;

use crate::{DispatchOrder, ERR_POISONED_LOCK, Handle};

enum Slot<C> {
    Idle(C),
    Firing,
}

struct HandlerEntry<C> {
    once: bool,
    slot: Slot<C>,
}

pub(crate) struct HandlerRegistry<C> {
    entries: BTreeMap<u64, HandlerEntry<C>>,
    next_id: u64,
    order: DispatchOrder,
}

impl<C> HandlerRegistry<C> {
    pub(crate) fn new(order: DispatchOrder) -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
            order,
        }
    }

    /// Adds a handler and returns the handle that identifies it.
    ///
    /// Ids come from a wrapping 64-bit counter. Should the counter ever wrap around, ids that
    /// still belong to live handlers are skipped so that a new handle never aliases a live one.
    /// Dispatch order follows id order, so after a wraparound the newest handlers sort before
    /// the older ones. Reaching that point takes 2^64 subscriptions on one registry.
    pub(crate) fn insert(&mut self, callback: C, once: bool) -> Handle {
        let mut id = self.next_id;
        while self.entries.contains_key(&id) {
            id = id.wrapping_add(1);
        }
        self.next_id = id.wrapping_add(1);

        self.entries.insert(
            id,
            HandlerEntry {
                once,
                slot: Slot::Idle(callback),
            },
        );

        Handle::new(id, once)
    }

    pub(crate) fn remove(&mut self, handle: Handle) -> bool {
        self.entries.remove(&handle.id()).is_some()
    }

    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle.id())
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn order(&self) -> DispatchOrder {
        self.order
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The ids of all live handlers in the order a trigger pass visits them.
    pub(crate) fn pass(&self) -> Vec<u64> {
        match self.order {
            DispatchOrder::NewestFirst => self.entries.keys().rev().copied().collect(),
            DispatchOrder::OldestFirst => self.entries.keys().copied().collect(),
        }
    }

    /// Checks out the callback of a handler that is about to be invoked.
    ///
    /// Returns `None` if the handler has been removed since the pass started or if it is
    /// already being invoked further up the stack.
    pub(crate) fn begin_firing(&mut self, id: u64) -> Option<C> {
        let entry = self.entries.get_mut(&id)?;

        match mem::replace(&mut entry.slot, Slot::Firing) {
            Slot::Idle(callback) => Some(callback),
            Slot::Firing => None,
        }
    }

    /// Returns a checked out callback after its invocation.
    ///
    /// Once-handlers are removed here, in the same dispatch step that invoked them. Handlers
    /// that were removed while firing are not resurrected.
    pub(crate) fn finish_firing(&mut self, id: u64, callback: C) {
        if let Entry::Occupied(mut entry) = self.entries.entry(id) {
            if entry.get().once {
                entry.remove();
            } else {
                entry.get_mut().slot = Slot::Idle(callback);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn rewind_ids_to(&mut self, next_id: u64) {
        self.next_id = next_id;
    }
}

impl<C> fmt::Debug for HandlerRegistry<C> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let firing = self
            .entries
            .values()
            .filter(|entry| matches!(entry.slot, Slot::Firing))
            .count();

        f.debug_struct("HandlerRegistry")
            .field("len", &self.entries.len())
            .field("firing", &firing)
            .field("next_id", &self.next_id)
            .field("order", &self.order)
            .finish()
    }
}

/// Short-lived mutable access to a registry that lives behind some form of interior mutability.
///
/// Implementations must not hold their borrow or lock beyond the call to `f`, because the
/// dispatcher invokes handlers between calls and handlers may call back into the owner.
pub(crate) trait RegistryAccess {
    type Callback;

    fn with_registry<R>(&self, f: impl FnOnce(&mut HandlerRegistry<Self::Callback>) -> R) -> R;
}

impl<C> RegistryAccess for RefCell<HandlerRegistry<C>> {
    type Callback = C;

    fn with_registry<R>(&self, f: impl FnOnce(&mut HandlerRegistry<C>) -> R) -> R {
        f(&mut self.borrow_mut())
    }
}

impl<C> RegistryAccess for Mutex<HandlerRegistry<C>> {
    type Callback = C;

    fn with_registry<R>(&self, f: impl FnOnce(&mut HandlerRegistry<C>) -> R) -> R {
        f(&mut self.lock().expect(ERR_POISONED_LOCK))
    }
}
