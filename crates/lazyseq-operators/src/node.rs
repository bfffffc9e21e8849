//! Operator nodes: immutable, `Rc`-shared descriptions of one deferred step.
//!
//! A node only knows its input node(s) and its parameters. Chaining wraps the
//! previous node in a new one; nothing here is ever mutated after
//! construction, so pipelines that share a prefix share its nodes.

use std::rc::Rc;

use lazyseq_core::plan::{Bounds, OpKind, PlanNode};

use crate::cursor::Cursor;
use crate::pipeline::Context;
use crate::set::SetNode;
use crate::sort::keys::{describe_keys, SortKeys};
use crate::sort::run::{Arrange, BufferedRun};
use crate::traits::{Source, Stage};

pub(crate) type Predicate<'s, T> = Rc<dyn Fn(&T) -> bool + 's>;
pub(crate) type Producer<'s, T> = Rc<dyn Fn() -> T + 's>;

pub(crate) enum Node<'s, T> {
    Source(Rc<dyn Source<'s, T> + 's>),
    Filter {
        input: Rc<Node<'s, T>>,
        predicate: Predicate<'s, T>,
    },
    Skip {
        input: Rc<Node<'s, T>>,
        count: usize,
    },
    Take {
        input: Rc<Node<'s, T>>,
        count: usize,
    },
    SkipWhile {
        input: Rc<Node<'s, T>>,
        predicate: Predicate<'s, T>,
    },
    TakeWhile {
        input: Rc<Node<'s, T>>,
        predicate: Predicate<'s, T>,
    },
    Concat {
        input: Rc<Node<'s, T>>,
        tail: Rc<Node<'s, T>>,
    },
    Append {
        input: Rc<Node<'s, T>>,
        item: Producer<'s, T>,
    },
    Prepend {
        input: Rc<Node<'s, T>>,
        item: Producer<'s, T>,
    },
    DefaultIfEmpty {
        input: Rc<Node<'s, T>>,
        item: Producer<'s, T>,
    },
    Set(SetNode<'s, T>),
    OrderBy {
        input: Rc<Node<'s, T>>,
        keys: SortKeys<'s, T>,
    },
    Reverse {
        input: Rc<Node<'s, T>>,
    },
    Stage(Rc<dyn Stage<'s, T> + 's>),
}

impl<'s, T: 's> Node<'s, T> {
    /// Build the cursor chain for one enumeration. Opening creates iterators
    /// but pulls nothing.
    pub(crate) fn open(&self, ctx: &Rc<Context>) -> Cursor<'s, T> {
        match self {
            Node::Source(source) => Cursor::Iter(source.open()),
            Node::Filter { input, predicate } => Cursor::Filter {
                input: Box::new(input.open(ctx)),
                predicate: Rc::clone(predicate),
            },
            Node::Skip { input, count } => Cursor::Skip {
                input: Box::new(input.open(ctx)),
                remaining: *count,
            },
            // take(0) never needs its input
            Node::Take { count: 0, .. } => Cursor::Done,
            Node::Take { input, count } => Cursor::Take {
                input: Box::new(input.open(ctx)),
                remaining: *count,
            },
            Node::SkipWhile { input, predicate } => Cursor::SkipWhile {
                input: Box::new(input.open(ctx)),
                predicate: Some(Rc::clone(predicate)),
            },
            Node::TakeWhile { input, predicate } => Cursor::TakeWhile {
                input: Box::new(input.open(ctx)),
                predicate: Rc::clone(predicate),
            },
            Node::Concat { input, tail } => Cursor::Concat {
                head: Box::new(input.open(ctx)),
                tail: Some(Rc::clone(tail)),
                ctx: Rc::clone(ctx),
            },
            Node::Append { input, item } => Cursor::Append {
                input: Box::new(input.open(ctx)),
                item: Some(Rc::clone(item)),
            },
            Node::Prepend { input, item } => Cursor::Prepend {
                item: Some(Rc::clone(item)),
                input: Box::new(input.open(ctx)),
            },
            Node::DefaultIfEmpty { input, item } => Cursor::DefaultIfEmpty {
                input: Box::new(input.open(ctx)),
                item: Some(Rc::clone(item)),
            },
            Node::Set(set) => Cursor::Set(Box::new(set.open(ctx))),
            Node::OrderBy { input, keys } => Cursor::Buffered(Box::new(BufferedRun::pending(
                input.open(ctx),
                Arrange::Sort(Rc::clone(keys)),
                ctx,
            ))),
            Node::Reverse { input } => Cursor::Buffered(Box::new(BufferedRun::pending(
                input.open(ctx),
                Arrange::Reverse,
                ctx,
            ))),
            Node::Stage(stage) => Cursor::Iter(stage.open(ctx)),
        }
    }

    pub(crate) fn plan(&self) -> PlanNode {
        match self {
            Node::Source(source) => {
                PlanNode::new(OpKind::Source, source.bounds()).with_detail(source.label())
            }
            Node::Filter { input, .. } => {
                PlanNode::unary(OpKind::Filter, input.plan(), |b| b)
            }
            Node::Skip { input, count } => {
                PlanNode::unary(OpKind::Skip, input.plan(), |b| b).with_detail(count.to_string())
            }
            Node::Take { input, count } => {
                PlanNode::unary(OpKind::Take, input.plan(), |_| Bounds::Finite)
                    .with_detail(count.to_string())
            }
            Node::SkipWhile { input, .. } => {
                PlanNode::unary(OpKind::SkipWhile, input.plan(), |b| b)
            }
            Node::TakeWhile { input, .. } => {
                PlanNode::unary(OpKind::TakeWhile, input.plan(), Bounds::weakened)
            }
            Node::Concat { input, tail } => {
                let head = input.plan();
                let tail = tail.plan();
                PlanNode::new(OpKind::Concat, head.bounds.chain(tail.bounds))
                    .with_input(head)
                    .with_input(tail)
            }
            Node::Append { input, .. } => PlanNode::unary(OpKind::Append, input.plan(), |b| b),
            Node::Prepend { input, .. } => PlanNode::unary(OpKind::Prepend, input.plan(), |b| b),
            Node::DefaultIfEmpty { input, .. } => {
                PlanNode::unary(OpKind::DefaultIfEmpty, input.plan(), |b| b)
            }
            Node::Set(set) => set.plan(),
            Node::OrderBy { input, keys } => {
                PlanNode::unary(OpKind::OrderBy, input.plan(), |b| b).with_detail(describe_keys(keys))
            }
            Node::Reverse { input } => PlanNode::unary(OpKind::Reverse, input.plan(), |b| b),
            Node::Stage(stage) => stage.plan(),
        }
    }
}
