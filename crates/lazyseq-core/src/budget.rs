//! Buffer accounting for the draining operators.
//!
//! Ordering, reverse, grouping, join and set operators hold element buffers
//! for the life of one enumeration. Each buffer is accounted through a
//! [`BufferGuard`] taken from the pipeline's [`BufferLedger`]; dropping the
//! guard (exhaustion, early stop, or unwinding) returns its elements.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Shared inner state for the ledger.
#[derive(Default)]
struct LedgerInner {
    live: Cell<usize>,
    peak: Cell<usize>,
}

impl LedgerInner {
    fn acquire(&self, elements: usize) {
        let next = self.live.get().saturating_add(elements);
        self.live.set(next);
        if next > self.peak.get() {
            self.peak.set(next);
        }
    }

    fn release(&self, elements: usize) {
        self.live.set(self.live.get().saturating_sub(elements));
    }
}

/// Element-count ledger shared by every pipeline derived from one root.
#[derive(Clone, Default)]
pub struct BufferLedger {
    inner: Rc<LedgerInner>,
}

impl BufferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements currently held by live buffers.
    pub fn live_elements(&self) -> usize {
        self.inner.live.get()
    }

    /// High-water mark since the ledger was created.
    pub fn peak_elements(&self) -> usize {
        self.inner.peak.get()
    }

    /// Open an empty guard; grow it as the buffer fills.
    pub fn guard(&self, tag: &'static str) -> BufferGuard {
        BufferGuard {
            inner: Rc::clone(&self.inner),
            elements: 0,
            tag,
        }
    }
}

impl fmt::Debug for BufferLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferLedger")
            .field("live", &self.live_elements())
            .field("peak", &self.peak_elements())
            .finish()
    }
}

/// RAII guard accounting for one buffer's elements.
pub struct BufferGuard {
    inner: Rc<LedgerInner>,
    elements: usize,
    tag: &'static str,
}

impl BufferGuard {
    pub fn grow(&mut self, elements: usize) {
        self.inner.acquire(elements);
        self.elements += elements;
    }

    pub fn elements(&self) -> usize {
        self.elements
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }
}

impl Drop for BufferGuard {
    fn drop(&mut self) {
        if self.elements > 0 {
            self.inner.release(self.elements);
            self.elements = 0;
        }
    }
}

impl fmt::Debug for BufferGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferGuard")
            .field("tag", &self.tag)
            .field("elements", &self.elements)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let ledger = BufferLedger::new();
        {
            let mut a = ledger.guard("order_by");
            a.grow(3);
            let mut b = ledger.guard("group_by");
            b.grow(2);
            assert_eq!(ledger.live_elements(), 5);
            assert_eq!(a.elements(), 3);
            assert_eq!(b.tag(), "group_by");
        }
        assert_eq!(ledger.live_elements(), 0);
        assert_eq!(ledger.peak_elements(), 5);
    }

    #[test]
    fn test_clones_share_accounting() {
        let ledger = BufferLedger::new();
        let other = ledger.clone();
        let mut g = other.guard("reverse");
        g.grow(4);
        assert_eq!(ledger.live_elements(), 4);
        drop(g);
        assert_eq!(ledger.live_elements(), 0);
    }
}
