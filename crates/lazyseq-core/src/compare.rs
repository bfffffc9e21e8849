//! Comparer and equality adapters.
//!
//! Every operator that ranks or identifies elements goes through one of these
//! two traits. Whether grouping-style operators may bucket by hash is a
//! property of the [`Equality`] adapter (`hashes()`), never of the operator.

use std::cmp::Ordering;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

/// Total ordering over `K`.
pub trait Comparer<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Equality over `K`, optionally paired with a consistent hash.
///
/// Implementations that return `true` from [`Equality::hashes`] must uphold
/// `equals(a, b) => hash_key(a) == hash_key(b)` and return `Some` from
/// `hash_key` for every key.
pub trait Equality<K: ?Sized> {
    fn equals(&self, a: &K, b: &K) -> bool;

    fn hash_key(&self, _key: &K) -> Option<u64> {
        None
    }

    fn hashes(&self) -> bool {
        false
    }
}

/// `Ord` ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparer<K> for NaturalOrder {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// `PartialOrd` ordering; incomparable pairs (e.g. NaN) tie.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialNaturalOrder;

impl<K: PartialOrd + ?Sized> Comparer<K> for PartialNaturalOrder {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.partial_cmp(b).unwrap_or(Ordering::Equal)
    }
}

/// Flips the wrapped comparer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reversed<C>(pub C);

impl<K: ?Sized, C: Comparer<K>> Comparer<K> for Reversed<C> {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self.0.compare(b, a)
    }
}

impl<K: ?Sized, F> Comparer<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

/// `PartialEq` equality without a hash: buckets by linear scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalEq;

impl<K: PartialEq + ?Sized> Equality<K> for NaturalEq {
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// `Eq + Hash` equality: buckets by hash.
#[derive(Debug, Clone, Default)]
pub struct HashedEq {
    state: RandomState,
}

impl HashedEq {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Eq + Hash + ?Sized> Equality<K> for HashedEq {
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }

    fn hash_key(&self, key: &K) -> Option<u64> {
        Some(self.state.hash_one(key))
    }

    fn hashes(&self) -> bool {
        true
    }
}

/// Caller-supplied equality with a paired hash function.
pub struct HashedBy<E, H> {
    eq: E,
    hash: H,
}

impl<E, H> HashedBy<E, H> {
    pub fn new(eq: E, hash: H) -> Self {
        Self { eq, hash }
    }
}

impl<K: ?Sized, E, H> Equality<K> for HashedBy<E, H>
where
    E: Fn(&K, &K) -> bool,
    H: Fn(&K) -> u64,
{
    fn equals(&self, a: &K, b: &K) -> bool {
        (self.eq)(a, b)
    }

    fn hash_key(&self, key: &K) -> Option<u64> {
        Some((self.hash)(key))
    }

    fn hashes(&self) -> bool {
        true
    }
}

impl<K: ?Sized, F> Equality<K> for F
where
    F: Fn(&K, &K) -> bool,
{
    fn equals(&self, a: &K, b: &K) -> bool {
        self(a, b)
    }
}
