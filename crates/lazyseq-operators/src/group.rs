//! `group_by` and the `Lookup` produced by `to_lookup`.
//!
//! Grouping is semi-eager: the first pull drains the input into a
//! [`BucketTable`], after which groups are yielded in first-seen key order.

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use lazyseq_core::budget::BufferGuard;
use lazyseq_core::compare::{Equality, HashedEq};
use lazyseq_core::config::BucketStrategy;
use lazyseq_core::plan::{OpKind, PlanNode};

use crate::bucket::{strategy_label, BucketTable};
use crate::cursor::Cursor;
use crate::metrics;
use crate::node::Node;
use crate::pipeline::{Context, Pipeline};
use crate::traits::Stage;

/// One key and every element that mapped to it, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping<K, V> {
    key: K,
    items: Vec<V>,
}

impl<K, V> Grouping<K, V> {
    pub fn new(key: K, items: Vec<V>) -> Self {
        Self { key, items }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn items(&self) -> &[V] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.items.iter()
    }

    pub fn into_parts(self) -> (K, Vec<V>) {
        (self.key, self.items)
    }
}

impl<K, V> IntoIterator for Grouping<K, V> {
    type Item = V;
    type IntoIter = std::vec::IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, K, V> IntoIterator for &'a Grouping<K, V> {
    type Item = &'a V;
    type IntoIter = std::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Drains `input` into buckets keyed by `key`, accounting every stored
/// element against `guard`.
pub(crate) fn bucket_all<'s, T, K, V>(
    input: impl Iterator<Item = T>,
    key: &dyn Fn(&T) -> K,
    element: &dyn Fn(T) -> V,
    table: &mut BucketTable<'s, K, Vec<V>>,
    guard: &mut BufferGuard,
) {
    for x in input {
        let k = key(&x);
        table.get_or_insert_with(k, Vec::new).push(element(x));
        guard.grow(1);
    }
}

struct GroupStage<'s, T, K, V> {
    input: Rc<Node<'s, T>>,
    key: Rc<dyn Fn(&T) -> K + 's>,
    element: Rc<dyn Fn(T) -> V + 's>,
    eq: Rc<dyn Equality<K> + 's>,
    bucketing: BucketStrategy,
}

enum GroupRun<'s, T, K, V> {
    Pending {
        input: Cursor<'s, T>,
        key: Rc<dyn Fn(&T) -> K + 's>,
        element: Rc<dyn Fn(T) -> V + 's>,
        eq: Rc<dyn Equality<K> + 's>,
        bucketing: BucketStrategy,
        ctx: Rc<Context>,
    },
    Ready {
        groups: std::vec::IntoIter<(K, Vec<V>)>,
        _guard: BufferGuard,
    },
}

impl<'s, T: 's, K: 's, V: 's> Iterator for GroupRun<'s, T, K, V> {
    type Item = Grouping<K, V>;

    fn next(&mut self) -> Option<Grouping<K, V>> {
        if let GroupRun::Pending {
            input,
            key,
            element,
            eq,
            bucketing,
            ctx,
        } = self
        {
            let mut guard = ctx.ledger().guard(OpKind::GroupBy.name());
            let mut table = BucketTable::new(Rc::clone(eq), *bucketing);
            bucket_all(input, &**key, &**element, &mut table, &mut guard);
            metrics::drained(OpKind::GroupBy, guard.elements());
            metrics::bucketed(OpKind::GroupBy, table.len(), table.is_hashed());
            *self = GroupRun::Ready {
                groups: table.into_entries().into_iter(),
                _guard: guard,
            };
        }

        match self {
            GroupRun::Ready { groups, .. } => groups.next().map(|(key, items)| Grouping { key, items }),
            GroupRun::Pending { .. } => None,
        }
    }
}

impl<'s, T: 's, K: 's, V: 's> Stage<'s, Grouping<K, V>> for GroupStage<'s, T, K, V> {
    fn open(&self, ctx: &Rc<Context>) -> Box<dyn Iterator<Item = Grouping<K, V>> + 's> {
        Box::new(GroupRun::Pending {
            input: self.input.open(ctx),
            key: Rc::clone(&self.key),
            element: Rc::clone(&self.element),
            eq: Rc::clone(&self.eq),
            bucketing: self.bucketing,
            ctx: Rc::clone(ctx),
        })
    }

    fn plan(&self) -> PlanNode {
        let detail = strategy_label(self.bucketing, self.eq.hashes());
        // one group per distinct key: never more than the input
        PlanNode::unary(OpKind::GroupBy, self.input.plan(), |b| b).with_detail(detail)
    }
}

impl<'s, T: 's> Pipeline<'s, T> {
    fn grouped<K: 's, V: 's>(
        &self,
        key: impl Fn(&T) -> K + 's,
        element: impl Fn(T) -> V + 's,
        eq: impl Equality<K> + 's,
    ) -> Pipeline<'s, Grouping<K, V>> {
        self.stage(GroupStage {
            input: Rc::clone(&self.node),
            key: Rc::new(key),
            element: Rc::new(element),
            eq: Rc::new(eq),
            bucketing: self.config().bucketing,
        })
    }

    /// Group elements by `key`, yielding groups in first-seen key order.
    /// Semi-eager: the first pull drains the input.
    pub fn group_by<K: Eq + Hash + 's>(
        &self,
        key: impl Fn(&T) -> K + 's,
    ) -> Pipeline<'s, Grouping<K, T>> {
        self.grouped(key, |x| x, HashedEq::new())
    }

    pub fn group_by_with<K: 's>(
        &self,
        key: impl Fn(&T) -> K + 's,
        eq: impl Equality<K> + 's,
    ) -> Pipeline<'s, Grouping<K, T>> {
        self.grouped(key, |x| x, eq)
    }

    /// Like [`Pipeline::group_by`], storing `element(x)` instead of `x`.
    pub fn group_by_select<K: Eq + Hash + 's, V: 's>(
        &self,
        key: impl Fn(&T) -> K + 's,
        element: impl Fn(T) -> V + 's,
    ) -> Pipeline<'s, Grouping<K, V>> {
        self.grouped(key, element, HashedEq::new())
    }
}

fn entry_key<K, V>(entry: &(K, Vec<V>)) -> &K {
    &entry.0
}

fn entry_view<K, V>(entry: &(K, Vec<V>)) -> (&K, &[V]) {
    (&entry.0, &entry.1)
}

/// Materialized one-to-many map from `to_lookup`. Keys keep first-seen
/// order; a missing key maps to an empty slice.
pub struct Lookup<'s, K, V> {
    table: BucketTable<'s, K, Vec<V>>,
}

impl<'s, K, V> Lookup<'s, K, V> {
    pub(crate) fn from_table(table: BucketTable<'s, K, Vec<V>>) -> Self {
        Self { table }
    }

    pub fn get(&self, key: &K) -> &[V] {
        self.table.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.table.contains(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.table.entries().iter().map(entry_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.table.entries().iter().map(entry_view)
    }

    pub fn into_groupings(self) -> Vec<Grouping<K, V>> {
        self.table
            .into_entries()
            .into_iter()
            .map(|(key, items)| Grouping { key, items })
            .collect()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Lookup<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyseq_core::compare::NaturalEq;
    use lazyseq_core::config::{BucketStrategy, QueryConfig};

    use crate::pipeline::Query;

    fn parts<K: Clone, V: Clone>(groups: &[Grouping<K, V>]) -> Vec<(K, Vec<V>)> {
        groups.iter().map(|g| (g.key().clone(), g.items().to_vec())).collect()
    }

    #[test]
    fn test_group_by_first_seen_order() {
        let data = [1, 2, 2, 3, 3, 3];
        let groups: Vec<Grouping<i32, i32>> = Pipeline::from_ref(&data)
            .group_by_select(|x| **x, |x| *x)
            .iter()
            .collect();
        assert_eq!(
            parts(&groups),
            vec![(1, vec![1]), (2, vec![2, 2]), (3, vec![3, 3, 3])]
        );
    }

    #[test]
    fn test_group_by_unhashable_key_with_scan_config() {
        let query = Query::new(QueryConfig::default().with_bucketing(BucketStrategy::Scan)).unwrap();
        let data = [0.5, 1.5, 0.5, 2.5, 1.5];
        let groups: Vec<Grouping<f64, &f64>> = query
            .from_ref(&data)
            .group_by_with(|x| **x, NaturalEq)
            .iter()
            .collect();
        let keys: Vec<f64> = groups.iter().map(|g| *g.key()).collect();
        assert_eq!(keys, vec![0.5, 1.5, 2.5]);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_group_buffer_released_on_early_stop() {
        let data = [1, 2, 1, 3];
        let grouped = Pipeline::from_ref(&data).group_by(|x| **x);
        let mut iter = grouped.iter();
        let first = iter.next().unwrap();
        assert_eq!(first.items(), &[&1, &1]);
        assert_eq!(grouped.ledger().live_elements(), 4);
        drop(iter);
        assert_eq!(grouped.ledger().live_elements(), 0);
    }

    #[test]
    fn test_grouping_accessors() {
        let group = Grouping::new("k", vec![1, 2]);
        assert_eq!(*group.key(), "k");
        assert!(!group.is_empty());
        assert_eq!(group.iter().sum::<i32>(), 3);
        let (key, items) = group.into_parts();
        assert_eq!((key, items), ("k", vec![1, 2]));
    }
}
