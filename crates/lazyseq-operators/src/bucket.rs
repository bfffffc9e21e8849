//! Key buckets shared by grouping, join and set operators.
//!
//! Keys only need an equality predicate. When the adapter also supplies a
//! consistent hash (and the config allows it) lookups go through a
//! `hash -> positions` index and collisions are resolved with `equals`;
//! otherwise every lookup scans the representatives in order, O(n·g).
//! Either way entries keep first-occurrence order.

use std::collections::HashMap;
use std::rc::Rc;

use lazyseq_core::compare::Equality;
use lazyseq_core::config::BucketStrategy;

/// Whether a table built under `strategy` goes through the hash index.
pub(crate) fn uses_hash(strategy: BucketStrategy, hashes: bool) -> bool {
    strategy == BucketStrategy::Auto && hashes
}

/// Plan detail naming the lookup path a table will take.
pub(crate) fn strategy_label(strategy: BucketStrategy, hashes: bool) -> &'static str {
    if uses_hash(strategy, hashes) {
        "hash"
    } else {
        "scan"
    }
}

pub(crate) struct BucketTable<'s, K, V> {
    eq: Rc<dyn Equality<K> + 's>,
    entries: Vec<(K, V)>,
    /// `Some` on the hash path.
    index: Option<HashMap<u64, Vec<usize>>>,
}

impl<'s, K, V> BucketTable<'s, K, V> {
    pub(crate) fn new(eq: Rc<dyn Equality<K> + 's>, strategy: BucketStrategy) -> Self {
        let index = uses_hash(strategy, eq.hashes()).then(HashMap::new);
        Self {
            eq,
            entries: Vec::new(),
            index,
        }
    }

    pub(crate) fn is_hashed(&self) -> bool {
        self.index.is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // an adapter that claims to hash but returns None lands everything in one
    // bucket; still correct, just slow
    fn slot(&self, key: &K) -> u64 {
        self.eq.hash_key(key).unwrap_or(0)
    }

    pub(crate) fn position(&self, key: &K) -> Option<usize> {
        match &self.index {
            Some(index) => index
                .get(&self.slot(key))?
                .iter()
                .copied()
                .find(|&at| self.eq.equals(&self.entries[at].0, key)),
            None => self.entries.iter().position(|(k, _)| self.eq.equals(k, key)),
        }
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.position(key).is_some()
    }

    fn push(&mut self, key: K, value: V) -> usize {
        let at = self.entries.len();
        if self.index.is_some() {
            let slot = self.slot(&key);
            if let Some(index) = self.index.as_mut() {
                index.entry(slot).or_default().push(at);
            }
        }
        self.entries.push((key, value));
        at
    }

    /// Insert unless an equal key is already present. Returns whether it was
    /// inserted.
    pub(crate) fn insert(&mut self, key: K, value: V) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.push(key, value);
        true
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        self.position(key).map(|at| &self.entries[at].1)
    }

    pub(crate) fn value(&self, at: usize) -> &V {
        &self.entries[at].1
    }

    pub(crate) fn get_or_insert_with(&mut self, key: K, init: impl FnOnce() -> V) -> &mut V {
        let at = match self.position(&key) {
            Some(at) => at,
            None => self.push(key, init()),
        };
        &mut self.entries[at].1
    }

    pub(crate) fn entries(&self) -> &[(K, V)] {
        &self.entries
    }

    pub(crate) fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }
}

/// Seen-set used by the single-membership operators.
pub(crate) type SeenSet<'s, K> = BucketTable<'s, K, ()>;

#[cfg(test)]
mod tests {
    use super::*;
    use lazyseq_core::compare::{HashedEq, NaturalEq};

    fn fill<'s>(mut table: BucketTable<'s, i32, Vec<i32>>) -> Vec<(i32, Vec<i32>)> {
        for x in [3, 1, 3, 2, 1, 3] {
            table.get_or_insert_with(x, Vec::new).push(x);
        }
        table.into_entries()
    }

    #[test]
    fn test_hash_and_scan_agree_on_first_occurrence_order() {
        let hashed = BucketTable::new(Rc::new(HashedEq::new()), BucketStrategy::Auto);
        assert!(hashed.is_hashed());
        let scanned = BucketTable::new(Rc::new(NaturalEq), BucketStrategy::Auto);
        assert!(!scanned.is_hashed());

        let expected = vec![(3, vec![3, 3, 3]), (1, vec![1, 1]), (2, vec![2])];
        assert_eq!(fill(hashed), expected);
        assert_eq!(fill(scanned), expected);
    }

    #[test]
    fn test_scan_strategy_overrides_hashing_adapter() {
        let table: SeenSet<'_, i32> = BucketTable::new(Rc::new(HashedEq::new()), BucketStrategy::Scan);
        assert!(!table.is_hashed());
        assert_eq!(strategy_label(BucketStrategy::Scan, true), "scan");
        assert_eq!(strategy_label(BucketStrategy::Auto, true), "hash");
        assert_eq!(strategy_label(BucketStrategy::Auto, false), "scan");
    }

    #[test]
    fn test_custom_equality_without_hash() {
        let same_parity = |a: &i32, b: &i32| a % 2 == b % 2;
        let mut seen: SeenSet<'_, i32> = BucketTable::new(Rc::new(same_parity), BucketStrategy::Auto);
        assert!(seen.insert(4, ()));
        assert!(seen.insert(7, ()));
        assert!(!seen.insert(10, ()));
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&9));
        assert_eq!(seen.get(&2), Some(&()));
    }

    #[test]
    fn test_unhashable_keys_bucket_by_scan() {
        let mut table: BucketTable<'_, f64, usize> = BucketTable::new(Rc::new(NaturalEq), BucketStrategy::Auto);
        for x in [0.5, 1.5, 0.5] {
            *table.get_or_insert_with(x, || 0) += 1;
        }
        let keys: Vec<(f64, usize)> = table.entries().to_vec();
        assert_eq!(keys, vec![(0.5, 2), (1.5, 1)]);
        assert!(!table.is_empty());
        assert_eq!(*table.value(1), 1);
    }
}
