//! Ordering operators: `order_by`/`then_by` and `reverse`.
//!
//! Both are semi-eager. Chaining them is free, but the first pull drains the
//! whole input into a buffer. On an infinite input that first pull never
//! returns; plans flag it (`PlanNode::hazards`) and `strict_bounds` turns the
//! flag into a `NonTerminating` error at the terminal.

pub(crate) mod keys;
pub(crate) mod run;

use std::ops::Deref;
use std::rc::Rc;

use lazyseq_core::compare::{Comparer, NaturalOrder};

use crate::node::Node;
use crate::pipeline::Pipeline;

use keys::{KeySpec, SortKey};

/// A pipeline whose last operator is an ordering; the only place `then_by`
/// is offered. Derefs to the ordered [`Pipeline`].
pub struct OrderedPipeline<'s, T> {
    input: Rc<Node<'s, T>>,
    keys: Vec<Rc<dyn SortKey<'s, T> + 's>>,
    ordered: Pipeline<'s, T>,
}

impl<'s, T: 's> OrderedPipeline<'s, T> {
    fn build(source: &Pipeline<'s, T>, input: Rc<Node<'s, T>>, keys: Vec<Rc<dyn SortKey<'s, T> + 's>>) -> Self {
        let node = Node::OrderBy {
            input: Rc::clone(&input),
            keys: Rc::from(keys.clone()),
        };
        Self {
            input,
            keys,
            ordered: source.chain(node),
        }
    }

    fn push_key(&self, key: Rc<dyn SortKey<'s, T> + 's>) -> Self {
        let mut keys = self.keys.clone();
        keys.push(key);
        Self::build(&self.ordered, Rc::clone(&self.input), keys)
    }

    /// Break ties of the keys so far by `key`, ascending.
    pub fn then_by<K: Ord + 's>(&self, key: impl Fn(&T) -> K + 's) -> Self {
        self.then_by_with(key, NaturalOrder)
    }

    pub fn then_by_descending<K: Ord + 's>(&self, key: impl Fn(&T) -> K + 's) -> Self {
        self.then_by_descending_with(key, NaturalOrder)
    }

    pub fn then_by_with<K: 's>(
        &self,
        key: impl Fn(&T) -> K + 's,
        comparer: impl Comparer<K> + 's,
    ) -> Self {
        self.push_key(Rc::new(KeySpec::new(key, comparer, false)))
    }

    pub fn then_by_descending_with<K: 's>(
        &self,
        key: impl Fn(&T) -> K + 's,
        comparer: impl Comparer<K> + 's,
    ) -> Self {
        self.push_key(Rc::new(KeySpec::new(key, comparer, true)))
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn into_pipeline(self) -> Pipeline<'s, T> {
        self.ordered
    }
}

impl<'s, T> Deref for OrderedPipeline<'s, T> {
    type Target = Pipeline<'s, T>;

    fn deref(&self) -> &Pipeline<'s, T> {
        &self.ordered
    }
}

impl<'s, T> Clone for OrderedPipeline<'s, T> {
    fn clone(&self) -> Self {
        Self {
            input: Rc::clone(&self.input),
            keys: self.keys.clone(),
            ordered: self.ordered.clone(),
        }
    }
}

impl<'s, T: 's> Pipeline<'s, T> {
    /// Stable ascending sort by `key`. Semi-eager.
    pub fn order_by<K: Ord + 's>(&self, key: impl Fn(&T) -> K + 's) -> OrderedPipeline<'s, T> {
        self.order_by_with(key, NaturalOrder)
    }

    pub fn order_by_descending<K: Ord + 's>(
        &self,
        key: impl Fn(&T) -> K + 's,
    ) -> OrderedPipeline<'s, T> {
        self.order_by_descending_with(key, NaturalOrder)
    }

    pub fn order_by_with<K: 's>(
        &self,
        key: impl Fn(&T) -> K + 's,
        comparer: impl Comparer<K> + 's,
    ) -> OrderedPipeline<'s, T> {
        let key: Rc<dyn SortKey<'s, T> + 's> = Rc::new(KeySpec::new(key, comparer, false));
        OrderedPipeline::build(self, Rc::clone(&self.node), vec![key])
    }

    pub fn order_by_descending_with<K: 's>(
        &self,
        key: impl Fn(&T) -> K + 's,
        comparer: impl Comparer<K> + 's,
    ) -> OrderedPipeline<'s, T> {
        let key: Rc<dyn SortKey<'s, T> + 's> = Rc::new(KeySpec::new(key, comparer, true));
        OrderedPipeline::build(self, Rc::clone(&self.node), vec![key])
    }

    /// Elements in reverse order. Semi-eager.
    pub fn reverse(&self) -> Pipeline<'s, T> {
        self.chain(Node::Reverse {
            input: Rc::clone(&self.node),
        })
    }
}
