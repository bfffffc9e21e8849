//! Tracing hooks (feature `tracing`).
//!
//! Without the feature every hook compiles to nothing. Wire a subscriber up
//! in the binary layer to see them.

use lazyseq_core::plan::OpKind;

#[cfg(feature = "tracing")]
pub(crate) fn enumeration_started() {
    tracing::trace!("enumeration started");
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn enumeration_started() {}

#[cfg(feature = "tracing")]
pub(crate) fn enumeration_finished(yielded: u64) {
    tracing::trace!(yielded, "enumeration exhausted");
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn enumeration_finished(_yielded: u64) {}

#[cfg(feature = "tracing")]
pub(crate) fn drained(op: OpKind, elements: usize) {
    tracing::debug!(op = op.name(), elements, "drained input into buffer");
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn drained(_op: OpKind, _elements: usize) {}

#[cfg(feature = "tracing")]
pub(crate) fn bucketed(op: OpKind, keys: usize, hashed: bool) {
    tracing::debug!(
        op = op.name(),
        keys,
        strategy = if hashed { "hash" } else { "scan" },
        "built key buckets"
    );
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn bucketed(_op: OpKind, _keys: usize, _hashed: bool) {}

#[cfg(feature = "tracing")]
pub(crate) fn unbounded_input(op: OpKind) {
    tracing::warn!(
        op = op.name(),
        "input reports itself infinite; this operator will not terminate"
    );
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn unbounded_input(_op: OpKind) {}
