//! `join` (inner equi-join) and `group_join` (left outer, grouped).
//!
//! Both are semi-eager on the inner side only: the first pull drains the
//! inner pipeline into a bucket index, then the outer pipeline streams and
//! each outer element probes the index. Output order is outer order, then
//! inner order within a bucket.

mod probe;

use std::hash::Hash;
use std::rc::Rc;

use lazyseq_core::compare::{Equality, HashedEq};
use lazyseq_core::config::BucketStrategy;
use lazyseq_core::plan::{OpKind, PlanNode};

use crate::bucket::strategy_label;
use crate::node::Node;
use crate::pipeline::{Context, Pipeline};
use crate::traits::Stage;

use probe::{GroupJoinRun, InnerIndex, JoinRun, KeyFn};

struct JoinKeys<'s, O, I, K> {
    outer: Rc<Node<'s, O>>,
    inner: Rc<Node<'s, I>>,
    outer_key: KeyFn<'s, O, K>,
    inner_key: KeyFn<'s, I, K>,
    eq: Rc<dyn Equality<K> + 's>,
    bucketing: BucketStrategy,
}

impl<'s, O: 's, I: 's, K: 's> JoinKeys<'s, O, I, K> {
    fn index(&self, op: OpKind, ctx: &Rc<Context>) -> InnerIndex<'s, I, K> {
        InnerIndex::pending(
            op,
            self.inner.open(ctx),
            Rc::clone(&self.inner_key),
            Rc::clone(&self.eq),
            self.bucketing,
            ctx,
        )
    }

    fn plan(&self, op: OpKind) -> PlanNode {
        let outer = self.outer.plan();
        let inner = self.inner.plan();
        let detail = strategy_label(self.bucketing, self.eq.hashes());
        // the outer side streams, so an infinite outer stays infinite
        PlanNode::new(op, outer.bounds)
            .with_detail(detail)
            .with_input(outer)
            .with_input(inner)
    }
}

struct JoinStage<'s, O, I, K, R> {
    keys: JoinKeys<'s, O, I, K>,
    result: Rc<dyn Fn(&O, &I) -> R + 's>,
}

impl<'s, O: 's, I: 's, K: 's, R: 's> Stage<'s, R> for JoinStage<'s, O, I, K, R> {
    fn open(&self, ctx: &Rc<Context>) -> Box<dyn Iterator<Item = R> + 's> {
        Box::new(JoinRun::new(
            self.keys.outer.open(ctx),
            Rc::clone(&self.keys.outer_key),
            self.keys.index(OpKind::Join, ctx),
            Rc::clone(&self.result),
        ))
    }

    fn plan(&self) -> PlanNode {
        self.keys.plan(OpKind::Join)
    }
}

struct GroupJoinStage<'s, O, I, K, R> {
    keys: JoinKeys<'s, O, I, K>,
    result: Rc<dyn Fn(O, &[I]) -> R + 's>,
}

impl<'s, O: 's, I: 's, K: 's, R: 's> Stage<'s, R> for GroupJoinStage<'s, O, I, K, R> {
    fn open(&self, ctx: &Rc<Context>) -> Box<dyn Iterator<Item = R> + 's> {
        Box::new(GroupJoinRun::new(
            self.keys.outer.open(ctx),
            Rc::clone(&self.keys.outer_key),
            self.keys.index(OpKind::GroupJoin, ctx),
            Rc::clone(&self.result),
        ))
    }

    fn plan(&self) -> PlanNode {
        self.keys.plan(OpKind::GroupJoin)
    }
}

impl<'s, O: 's> Pipeline<'s, O> {
    fn join_keys<I: 's, K: 's>(
        &self,
        inner: &Pipeline<'s, I>,
        outer_key: impl Fn(&O) -> K + 's,
        inner_key: impl Fn(&I) -> K + 's,
        eq: impl Equality<K> + 's,
    ) -> JoinKeys<'s, O, I, K> {
        JoinKeys {
            outer: Rc::clone(&self.node),
            inner: Rc::clone(&inner.node),
            outer_key: Rc::new(outer_key),
            inner_key: Rc::new(inner_key),
            eq: Rc::new(eq),
            bucketing: self.config().bucketing,
        }
    }

    /// Inner equi-join: `result(o, i)` for every pair whose keys are equal.
    ///
    /// The inner pipeline's own configuration is ignored; this pipeline's
    /// config and ledger govern the whole join.
    pub fn join<I: 's, K: Eq + Hash + 's, R: 's>(
        &self,
        inner: &Pipeline<'s, I>,
        outer_key: impl Fn(&O) -> K + 's,
        inner_key: impl Fn(&I) -> K + 's,
        result: impl Fn(&O, &I) -> R + 's,
    ) -> Pipeline<'s, R> {
        self.join_with(inner, outer_key, inner_key, result, HashedEq::new())
    }

    pub fn join_with<I: 's, K: 's, R: 's>(
        &self,
        inner: &Pipeline<'s, I>,
        outer_key: impl Fn(&O) -> K + 's,
        inner_key: impl Fn(&I) -> K + 's,
        result: impl Fn(&O, &I) -> R + 's,
        eq: impl Equality<K> + 's,
    ) -> Pipeline<'s, R> {
        self.stage(JoinStage {
            keys: self.join_keys(inner, outer_key, inner_key, eq),
            result: Rc::new(result),
        })
    }

    /// One `result(o, matches)` per outer element; `matches` is empty when
    /// no inner element shares its key.
    pub fn group_join<I: 's, K: Eq + Hash + 's, R: 's>(
        &self,
        inner: &Pipeline<'s, I>,
        outer_key: impl Fn(&O) -> K + 's,
        inner_key: impl Fn(&I) -> K + 's,
        result: impl Fn(O, &[I]) -> R + 's,
    ) -> Pipeline<'s, R> {
        self.group_join_with(inner, outer_key, inner_key, result, HashedEq::new())
    }

    pub fn group_join_with<I: 's, K: 's, R: 's>(
        &self,
        inner: &Pipeline<'s, I>,
        outer_key: impl Fn(&O) -> K + 's,
        inner_key: impl Fn(&I) -> K + 's,
        result: impl Fn(O, &[I]) -> R + 's,
        eq: impl Equality<K> + 's,
    ) -> Pipeline<'s, R> {
        self.stage(GroupJoinStage {
            keys: self.join_keys(inner, outer_key, inner_key, eq),
            result: Rc::new(result),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use lazyseq_core::plan::Eagerness;

    #[test]
    fn test_join_pairs_in_outer_then_inner_order() {
        let people = [(1, "ann"), (2, "bob"), (3, "cy")];
        let pets = [(2, "rex"), (1, "tom"), (2, "fido")];
        let pairs: Vec<(&str, &str)> = Pipeline::from_ref(&people)
            .join(
                &Pipeline::from_ref(&pets),
                |p| p.0,
                |q| q.0,
                |p, q| (p.1, q.1),
            )
            .iter()
            .collect();
        assert_eq!(pairs, vec![("ann", "tom"), ("bob", "rex"), ("bob", "fido")]);
    }

    #[test]
    fn test_group_join_keeps_unmatched_outer() {
        let keys = [1, 2, 3];
        let values = [(1, 'a'), (3, 'b'), (1, 'c')];
        let out: Vec<(i32, usize)> = Pipeline::from_ref(&keys)
            .group_join(
                &Pipeline::from_ref(&values),
                |k| **k,
                |v| v.0,
                |k, matches| (*k, matches.len()),
            )
            .iter()
            .collect();
        assert_eq!(out, vec![(1, 2), (2, 0), (3, 1)]);
    }

    #[test]
    fn test_join_skips_outer_when_inner_empty() {
        let counter = Cell::new(0);
        let pulled = &counter;
        let outer = Pipeline::generate(move || (0..).inspect(move |_| pulled.set(pulled.get() + 1)));
        let inner: Pipeline<'_, i32> = Pipeline::empty();
        let joined = outer.join(&inner, |o| *o, |i| *i, |o, _| *o);
        assert_eq!(joined.iter().next(), None);
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_join_plan_drains_inner_only() {
        let a = [1];
        let b = [1];
        let plan = Pipeline::from_ref(&a)
            .join(&Pipeline::from_ref(&b), |x| **x, |y| **y, |x, _| **x)
            .explain();
        assert_eq!(plan.op, OpKind::Join);
        assert_eq!(plan.eagerness, Eagerness::SemiEager);
        assert_eq!(OpKind::Join.drained_inputs(), &[1]);
        assert_eq!(plan.inputs.len(), 2);
    }
}
