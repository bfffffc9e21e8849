//! Single-membership operators: `distinct`, `distinct_by`, `union`,
//! `intersect`, `except`.
//!
//! All of them keep one seen-set per enumeration, built as the output is
//! streamed, so the first occurrence of a value wins. `distinct`, `distinct_by`
//! and `union` stay usable on unbounded inputs. `intersect` and `except` drain
//! their second input on the first pull.

use std::hash::Hash;
use std::rc::Rc;

use lazyseq_core::budget::BufferGuard;
use lazyseq_core::compare::{Equality, HashedEq};
use lazyseq_core::config::BucketStrategy;
use lazyseq_core::plan::{OpKind, PlanNode};

use crate::bucket::{strategy_label, BucketTable, SeenSet};
use crate::cursor::Cursor;
use crate::metrics;
use crate::node::Node;
use crate::pipeline::{Context, Pipeline};
use crate::traits::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SetOp {
    Distinct,
    Union,
    Intersect,
    Except,
}

impl SetOp {
    fn kind(self) -> OpKind {
        match self {
            SetOp::Distinct => OpKind::Distinct,
            SetOp::Union => OpKind::Union,
            SetOp::Intersect => OpKind::Intersect,
            SetOp::Except => OpKind::Except,
        }
    }
}

pub(crate) struct SetNode<'s, T> {
    op: SetOp,
    input: Rc<Node<'s, T>>,
    other: Option<Rc<Node<'s, T>>>,
    eq: Rc<dyn Equality<T> + 's>,
    bucketing: BucketStrategy,
    /// Copies an element into the seen-set; the original is yielded.
    dup: fn(&T) -> T,
}

impl<'s, T: 's> SetNode<'s, T> {
    pub(crate) fn open(&self, ctx: &Rc<Context>) -> SetCursor<'s, T> {
        let bucketing = self.bucketing;
        SetCursor {
            op: self.op,
            input: self.input.open(ctx),
            other: self.other.clone(),
            ctx: Rc::clone(ctx),
            seen: BucketTable::new(Rc::clone(&self.eq), bucketing),
            probe: BucketTable::new(Rc::clone(&self.eq), bucketing),
            dup: self.dup,
            guard: ctx.ledger().guard(self.op.kind().name()),
        }
    }

    pub(crate) fn plan(&self) -> PlanNode {
        let input = self.input.plan();
        let other = self.other.as_ref().map(|node| node.plan());
        let bounds = match (self.op, &other) {
            (SetOp::Union, Some(other)) => input.bounds.chain(other.bounds),
            _ => input.bounds,
        };
        let mut plan = PlanNode::new(self.op.kind(), bounds)
            .with_detail(strategy_label(self.bucketing, self.eq.hashes()))
            .with_input(input);
        if let Some(other) = other {
            plan = plan.with_input(other);
        }
        plan
    }
}

pub(crate) struct SetCursor<'s, T> {
    op: SetOp,
    input: Cursor<'s, T>,
    /// Union: opened once `input` runs dry. Intersect/except: drained on the
    /// first pull.
    other: Option<Rc<Node<'s, T>>>,
    ctx: Rc<Context>,
    seen: SeenSet<'s, T>,
    /// Intersect only: members of the second input.
    probe: SeenSet<'s, T>,
    dup: fn(&T) -> T,
    guard: BufferGuard,
}

impl<'s, T: 's> SetCursor<'s, T> {
    fn drain_other(&mut self, node: Rc<Node<'s, T>>) {
        let target = match self.op {
            SetOp::Intersect => &mut self.probe,
            _ => &mut self.seen,
        };
        let mut drained = 0;
        for x in node.open(&self.ctx) {
            drained += 1;
            if target.insert(x, ()) {
                self.guard.grow(1);
            }
        }
        metrics::drained(self.op.kind(), drained);
    }
}

impl<'s, T: 's> Iterator for SetCursor<'s, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if matches!(self.op, SetOp::Intersect | SetOp::Except) {
            if let Some(node) = self.other.take() {
                self.drain_other(node);
            }
        }

        loop {
            let x = match self.input.next() {
                Some(x) => x,
                None => match self.other.take() {
                    Some(node) if self.op == SetOp::Union => {
                        self.input = node.open(&self.ctx);
                        continue;
                    }
                    _ => return None,
                },
            };
            if self.op == SetOp::Intersect && !self.probe.contains(&x) {
                continue;
            }
            if self.seen.contains(&x) {
                continue;
            }
            self.seen.insert((self.dup)(&x), ());
            self.guard.grow(1);
            return Some(x);
        }
    }
}

/// `distinct_by`: membership decided on a projected key, so the element
/// itself never has to be cloned.
struct DistinctByStage<'s, T, K> {
    input: Rc<Node<'s, T>>,
    key: Rc<dyn Fn(&T) -> K + 's>,
    eq: Rc<dyn Equality<K> + 's>,
    bucketing: BucketStrategy,
}

impl<'s, T: 's, K: 's> Stage<'s, T> for DistinctByStage<'s, T, K> {
    fn open(&self, ctx: &Rc<Context>) -> Box<dyn Iterator<Item = T> + 's> {
        let key = Rc::clone(&self.key);
        let mut seen: SeenSet<'s, K> = BucketTable::new(Rc::clone(&self.eq), self.bucketing);
        let mut guard = ctx.ledger().guard(OpKind::DistinctBy.name());
        Box::new(self.input.open(ctx).filter(move |x| {
            let fresh = seen.insert(key(x), ());
            if fresh {
                guard.grow(1);
            }
            fresh
        }))
    }

    fn plan(&self) -> PlanNode {
        PlanNode::unary(OpKind::DistinctBy, self.input.plan(), |b| b)
            .with_detail(strategy_label(self.bucketing, self.eq.hashes()))
    }
}

impl<'s, T: Clone + 's> Pipeline<'s, T> {
    fn set_op(&self, op: SetOp, other: Option<&Pipeline<'s, T>>, eq: Rc<dyn Equality<T> + 's>) -> Self {
        self.chain(Node::Set(SetNode {
            op,
            input: Rc::clone(&self.node),
            other: other.map(|p| Rc::clone(&p.node)),
            eq,
            bucketing: self.config().bucketing,
            dup: T::clone,
        }))
    }

    /// Drop repeated elements; the first occurrence wins. Lazy.
    pub fn distinct(&self) -> Self
    where
        T: Eq + Hash,
    {
        self.distinct_with(HashedEq::new())
    }

    pub fn distinct_with(&self, eq: impl Equality<T> + 's) -> Self {
        self.set_op(SetOp::Distinct, None, Rc::new(eq))
    }

    /// Distinct elements of `self`, then those of `other` not seen yet. Lazy.
    pub fn union(&self, other: &Pipeline<'s, T>) -> Self
    where
        T: Eq + Hash,
    {
        self.union_with(other, HashedEq::new())
    }

    pub fn union_with(&self, other: &Pipeline<'s, T>, eq: impl Equality<T> + 's) -> Self {
        self.set_op(SetOp::Union, Some(other), Rc::new(eq))
    }

    /// Distinct elements of `self` that also occur in `other`. Semi-eager:
    /// `other` is drained on the first pull.
    pub fn intersect(&self, other: &Pipeline<'s, T>) -> Self
    where
        T: Eq + Hash,
    {
        self.intersect_with(other, HashedEq::new())
    }

    pub fn intersect_with(&self, other: &Pipeline<'s, T>, eq: impl Equality<T> + 's) -> Self {
        self.set_op(SetOp::Intersect, Some(other), Rc::new(eq))
    }

    /// Distinct elements of `self` that do not occur in `other`. Semi-eager:
    /// `other` is drained on the first pull.
    pub fn except(&self, other: &Pipeline<'s, T>) -> Self
    where
        T: Eq + Hash,
    {
        self.except_with(other, HashedEq::new())
    }

    pub fn except_with(&self, other: &Pipeline<'s, T>, eq: impl Equality<T> + 's) -> Self {
        self.set_op(SetOp::Except, Some(other), Rc::new(eq))
    }
}

impl<'s, T: 's> Pipeline<'s, T> {
    /// Keep the first element for each distinct `key`. Lazy.
    pub fn distinct_by<K: Eq + Hash + 's>(&self, key: impl Fn(&T) -> K + 's) -> Self {
        self.distinct_by_with(key, HashedEq::new())
    }

    pub fn distinct_by_with<K: 's>(
        &self,
        key: impl Fn(&T) -> K + 's,
        eq: impl Equality<K> + 's,
    ) -> Self {
        self.stage(DistinctByStage {
            input: Rc::clone(&self.node),
            key: Rc::new(key),
            eq: Rc::new(eq),
            bucketing: self.config().bucketing,
        })
    }
}
