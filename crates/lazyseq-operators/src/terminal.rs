//! Terminal evaluators: eager consumers that drive one enumeration to
//! exhaustion or to their early-stop condition.
//!
//! Every terminal inspects the plan first (see `Pipeline::start`), so under
//! `strict_bounds` a hazardous chain fails with `NonTerminating` before the
//! source is touched.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::iter::Sum;
use std::rc::Rc;

use lazyseq_core::compare::{Comparer, Equality, HashedEq};
use lazyseq_core::error::{Error, Result};
use lazyseq_core::plan::OpKind;

use crate::bucket::BucketTable;
use crate::group::{bucket_all, Lookup};
use crate::metrics;
use crate::pipeline::Pipeline;

/// The only element of `iter`; stops pulling at the second one.
fn only<T>(mut iter: impl Iterator<Item = T>, none: Error) -> Result<T> {
    let first = iter.next().ok_or(none)?;
    match iter.next() {
        Some(_) => Err(Error::MultipleElements),
        None => Ok(first),
    }
}

/// First element for which no later element is strictly `better`.
fn extreme<T>(iter: impl Iterator<Item = T>, better: impl Fn(&T, &T) -> bool) -> Result<T> {
    iter.reduce(|best, x| if better(&x, &best) { x } else { best })
        .ok_or(Error::EmptySequence)
}

fn extreme_by_key<T, K>(
    iter: impl Iterator<Item = T>,
    key: impl Fn(&T) -> K,
    better: impl Fn(&K, &K) -> bool,
) -> Result<T> {
    iter.map(|x| (key(&x), x))
        .reduce(|best, next| if better(&next.0, &best.0) { next } else { best })
        .map(|(_, x)| x)
        .ok_or(Error::EmptySequence)
}

impl<'s, T: 's> Pipeline<'s, T> {
    pub fn count(&self) -> Result<usize> {
        Ok(self.start(OpKind::Count)?.count())
    }

    pub fn count_where(&self, predicate: impl Fn(&T) -> bool) -> Result<usize> {
        Ok(self.start(OpKind::Count)?.filter(|x| predicate(x)).count())
    }

    /// Fails with `EmptySequence`. Pulls at most one element.
    pub fn first(&self) -> Result<T> {
        self.start(OpKind::First)?.next().ok_or(Error::EmptySequence)
    }

    /// Fails with `NoMatch`. Stops at the first hit.
    pub fn first_where(&self, predicate: impl Fn(&T) -> bool) -> Result<T> {
        self.start(OpKind::First)?
            .find(|x| predicate(x))
            .ok_or(Error::NoMatch)
    }

    pub fn first_or(&self, default: T) -> Result<T> {
        Ok(self.start(OpKind::First)?.next().unwrap_or(default))
    }

    pub fn last(&self) -> Result<T> {
        self.start(OpKind::Last)?.last().ok_or(Error::EmptySequence)
    }

    pub fn last_or(&self, default: T) -> Result<T> {
        Ok(self.start(OpKind::Last)?.last().unwrap_or(default))
    }

    /// Fails with `EmptySequence` or `MultipleElements`; never pulls past
    /// the second element.
    pub fn single(&self) -> Result<T> {
        only(self.start(OpKind::Single)?, Error::EmptySequence)
    }

    /// Fails with `NoMatch` or `MultipleElements`; stops at the second match.
    pub fn single_where(&self, predicate: impl Fn(&T) -> bool) -> Result<T> {
        only(self.start(OpKind::Single)?.filter(|x| predicate(x)), Error::NoMatch)
    }

    /// `default` for an empty sequence; still fails on more than one element.
    pub fn single_or(&self, default: T) -> Result<T> {
        match only(self.start(OpKind::Single)?, Error::EmptySequence) {
            Err(Error::EmptySequence) => Ok(default),
            other => other,
        }
    }

    /// Fails with `OutOfRange` carrying the observed length.
    pub fn element_at(&self, index: usize) -> Result<T> {
        let mut len = 0;
        for x in self.start(OpKind::ElementAt)? {
            if len == index {
                return Ok(x);
            }
            len += 1;
        }
        Err(Error::OutOfRange { index, len })
    }

    pub fn element_at_or(&self, index: usize, default: T) -> Result<T> {
        Ok(self
            .start(OpKind::ElementAt)?
            .nth(index)
            .unwrap_or(default))
    }

    pub fn any(&self) -> Result<bool> {
        Ok(self.start(OpKind::Any)?.next().is_some())
    }

    pub fn any_where(&self, predicate: impl Fn(&T) -> bool) -> Result<bool> {
        Ok(self.start(OpKind::Any)?.any(|x| predicate(&x)))
    }

    /// True for an empty sequence. Stops at the first miss.
    pub fn all(&self, predicate: impl Fn(&T) -> bool) -> Result<bool> {
        Ok(self.start(OpKind::All)?.all(|x| predicate(&x)))
    }

    pub fn contains(&self, value: &T) -> Result<bool>
    where
        T: PartialEq,
    {
        Ok(self.start(OpKind::Contains)?.any(|x| x == *value))
    }

    pub fn contains_with(&self, value: &T, eq: impl Equality<T>) -> Result<bool> {
        Ok(self.start(OpKind::Contains)?.any(|x| eq.equals(&x, value)))
    }

    /// Left fold seeded with the first element. Fails with `EmptySequence`.
    pub fn aggregate(&self, f: impl Fn(T, T) -> T) -> Result<T> {
        self.start(OpKind::Aggregate)?
            .reduce(f)
            .ok_or(Error::EmptySequence)
    }

    pub fn aggregate_seeded<A>(&self, seed: A, f: impl Fn(A, T) -> A) -> Result<A> {
        Ok(self.start(OpKind::Aggregate)?.fold(seed, f))
    }

    /// Seeded fold followed by a projection of the final accumulator.
    pub fn aggregate_with<A, R>(
        &self,
        seed: A,
        f: impl Fn(A, T) -> A,
        result: impl FnOnce(A) -> R,
    ) -> Result<R> {
        self.aggregate_seeded(seed, f).map(result)
    }

    /// Zero for an empty sequence, following `Sum`.
    pub fn sum<S: Sum<T>>(&self) -> Result<S> {
        Ok(self.start(OpKind::Sum)?.sum())
    }

    /// Smallest element; the first one on ties. Fails with `EmptySequence`.
    pub fn min(&self) -> Result<T>
    where
        T: Ord,
    {
        extreme(self.start(OpKind::Min)?, |x, best| x < best)
    }

    /// Largest element; the first one on ties. Fails with `EmptySequence`.
    pub fn max(&self) -> Result<T>
    where
        T: Ord,
    {
        extreme(self.start(OpKind::Max)?, |x, best| x > best)
    }

    pub fn min_by_key<K: Ord>(&self, key: impl Fn(&T) -> K) -> Result<T> {
        extreme_by_key(self.start(OpKind::Min)?, key, |k, best| k < best)
    }

    pub fn max_by_key<K: Ord>(&self, key: impl Fn(&T) -> K) -> Result<T> {
        extreme_by_key(self.start(OpKind::Max)?, key, |k, best| k > best)
    }

    pub fn min_with(&self, comparer: impl Comparer<T>) -> Result<T> {
        extreme(self.start(OpKind::Min)?, |x, best| comparer.compare(x, best).is_lt())
    }

    pub fn max_with(&self, comparer: impl Comparer<T>) -> Result<T> {
        extreme(self.start(OpKind::Max)?, |x, best| comparer.compare(x, best).is_gt())
    }

    /// Arithmetic mean. Fails with `EmptySequence`.
    pub fn average(&self) -> Result<f64>
    where
        T: Into<f64>,
    {
        self.average_by(Into::into)
    }

    pub fn average_by(&self, value: impl Fn(T) -> f64) -> Result<f64> {
        let (total, n) = self
            .start(OpKind::Average)?
            .fold((0.0, 0usize), |(total, n), x| (total + value(x), n + 1));
        if n == 0 {
            return Err(Error::EmptySequence);
        }
        Ok(total / n as f64)
    }

    /// Element-wise equality with `other`; stops at the first difference.
    pub fn sequence_equal(&self, other: &Pipeline<'s, T>) -> Result<bool>
    where
        T: PartialEq,
    {
        self.sequence_equal_with(other, |a: &T, b: &T| a == b)
    }

    pub fn sequence_equal_with(&self, other: &Pipeline<'s, T>, eq: impl Equality<T>) -> Result<bool> {
        let mut left = self.start(OpKind::SequenceEqual)?;
        let mut right = other.start(OpKind::SequenceEqual)?;
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ok(true),
                (Some(a), Some(b)) if eq.equals(&a, &b) => continue,
                _ => return Ok(false),
            }
        }
    }

    pub fn to_vec(&self) -> Result<Vec<T>> {
        Ok(self.start(OpKind::ToVec)?.collect())
    }

    pub fn to_set(&self) -> Result<HashSet<T>>
    where
        T: Eq + Hash,
    {
        Ok(self.start(OpKind::ToSet)?.collect())
    }

    /// Fails with `DuplicateKey` at the first repeated key.
    pub fn to_map<K: Eq + Hash, V>(
        &self,
        key: impl Fn(&T) -> K,
        value: impl Fn(T) -> V,
    ) -> Result<HashMap<K, V>> {
        let mut map = HashMap::new();
        for (index, x) in self.start(OpKind::ToMap)?.enumerate() {
            match map.entry(key(&x)) {
                Entry::Occupied(_) => return Err(Error::DuplicateKey { index }),
                Entry::Vacant(slot) => {
                    slot.insert(value(x));
                }
            }
        }
        Ok(map)
    }

    /// Like [`Pipeline::to_map`], combining colliding values with
    /// `merge(existing, incoming)`.
    pub fn to_map_merge<K: Eq + Hash, V>(
        &self,
        key: impl Fn(&T) -> K,
        value: impl Fn(T) -> V,
        merge: impl Fn(V, V) -> V,
    ) -> Result<HashMap<K, V>> {
        let mut map = HashMap::new();
        for x in self.start(OpKind::ToMap)? {
            let k = key(&x);
            let incoming = value(x);
            let merged = match map.remove(&k) {
                Some(existing) => merge(existing, incoming),
                None => incoming,
            };
            map.insert(k, merged);
        }
        Ok(map)
    }

    pub fn to_lookup<K: Eq + Hash + 's>(&self, key: impl Fn(&T) -> K) -> Result<Lookup<'s, K, T>> {
        self.to_lookup_with(key, |x| x, HashedEq::new())
    }

    /// Bucket every element by `key`. The drain is accounted against the
    /// ledger; the finished lookup belongs to the caller and is not.
    pub fn to_lookup_with<K: 's, V>(
        &self,
        key: impl Fn(&T) -> K,
        element: impl Fn(T) -> V,
        eq: impl Equality<K> + 's,
    ) -> Result<Lookup<'s, K, V>> {
        let iter = self.start(OpKind::ToLookup)?;
        let mut guard = self.ledger().guard(OpKind::ToLookup.name());
        let mut table = BucketTable::new(Rc::new(eq), self.config().bucketing);
        bucket_all(iter, &key, &element, &mut table, &mut guard);
        metrics::drained(OpKind::ToLookup, guard.elements());
        metrics::bucketed(OpKind::ToLookup, table.len(), table.is_hashed());
        Ok(Lookup::from_table(table))
    }
}
