// A poisoned lock means a handler panicked while we were mutating shared state. We cannot tell
// which invariants were left half-updated, so continuing is not safe and we panic as well.
pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock - an emitter is in an \
    inconsistent state after a panic and can no longer uphold its delivery guarantees";

// Label used in log records for emitters that were not given a name.
pub(crate) const DEFAULT_NAME: &str = "emitter";
