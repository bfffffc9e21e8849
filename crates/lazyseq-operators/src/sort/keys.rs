//! Sort keys and the stable multi-key sort.
//!
//! A key is a (selector, comparer, direction) triple. Keys are registered in
//! order (primary first, each `then_by` appends a tie-break) and are only
//! evaluated once the input has been drained: each selector runs once per
//! element, and the sort compares the extracted key columns by position.

use std::cmp::Ordering;
use std::rc::Rc;

use lazyseq_core::compare::Comparer;

pub(crate) type SortKeys<'s, T> = Rc<[Rc<dyn SortKey<'s, T> + 's>]>;

pub(crate) trait SortKey<'s, T> {
    /// Evaluate the selector over every buffered element.
    fn extract(&self, items: &[T]) -> Box<dyn KeyColumn + 's>;

    fn descending(&self) -> bool;
}

/// Extracted keys for one sort key, compared by element position.
pub(crate) trait KeyColumn {
    fn compare(&self, a: usize, b: usize) -> Ordering;
}

pub(crate) struct KeySpec<'s, T, K> {
    selector: Rc<dyn Fn(&T) -> K + 's>,
    comparer: Rc<dyn Comparer<K> + 's>,
    descending: bool,
}

impl<'s, T, K> KeySpec<'s, T, K> {
    pub(crate) fn new(
        selector: impl Fn(&T) -> K + 's,
        comparer: impl Comparer<K> + 's,
        descending: bool,
    ) -> Self {
        Self {
            selector: Rc::new(selector),
            comparer: Rc::new(comparer),
            descending,
        }
    }
}

impl<'s, T, K: 's> SortKey<'s, T> for KeySpec<'s, T, K> {
    fn extract(&self, items: &[T]) -> Box<dyn KeyColumn + 's> {
        Box::new(ExtractedKeys {
            keys: items.iter().map(|x| (self.selector)(x)).collect(),
            comparer: Rc::clone(&self.comparer),
            descending: self.descending,
        })
    }

    fn descending(&self) -> bool {
        self.descending
    }
}

struct ExtractedKeys<'s, K> {
    keys: Vec<K>,
    comparer: Rc<dyn Comparer<K> + 's>,
    descending: bool,
}

impl<K> KeyColumn for ExtractedKeys<'_, K> {
    fn compare(&self, a: usize, b: usize) -> Ordering {
        let ord = self.comparer.compare(&self.keys[a], &self.keys[b]);
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// Stable sort of `items` by the key tuple. Elements whose whole tuple ties
/// keep their input order.
pub(crate) fn stable_sort<'s, T>(items: Vec<T>, keys: &[Rc<dyn SortKey<'s, T> + 's>]) -> Vec<T> {
    if items.len() < 2 || keys.is_empty() {
        return items;
    }

    let columns: Vec<Box<dyn KeyColumn + 's>> = keys.iter().map(|k| k.extract(&items)).collect();

    let mut order: Vec<usize> = (0..items.len()).collect();
    // slice::sort_by is a stable merge sort
    order.sort_by(|&a, &b| {
        columns
            .iter()
            .map(|c| c.compare(a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

pub(crate) fn describe_keys<'s, T>(keys: &[Rc<dyn SortKey<'s, T> + 's>]) -> String {
    keys.iter()
        .map(|k| if k.descending() { "desc" } else { "asc" })
        .collect::<Vec<_>>()
        .join(", ")
}
