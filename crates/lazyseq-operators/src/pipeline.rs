//! The caller-facing pipeline handle and its ingestion points.
//!
//! A `Pipeline` pairs the latest operator node with the context fixed at its
//! root (configuration plus buffer ledger). Chaining borrows `&self` and
//! returns a new handle, so several pipelines may grow from one prefix; each
//! enumeration of each handle gets its own cursors.

use std::fmt;
use std::rc::Rc;

use lazyseq_core::budget::BufferLedger;
use lazyseq_core::config::QueryConfig;
use lazyseq_core::error::{Error, Result};
use lazyseq_core::hash::{fingerprint_serde, Fingerprint};
use lazyseq_core::plan::{Bounds, OpKind, PlanNode};

use crate::engine::Enumeration;
use crate::metrics;
use crate::node::Node;
use crate::source::{Borrowed, Generated, OneShot};
use crate::traits::{Source, Stage};

/// Per-root state shared by every pipeline chained from that root.
#[derive(Debug, Default)]
pub struct Context {
    config: QueryConfig,
    ledger: BufferLedger,
}

impl Context {
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn ledger(&self) -> &BufferLedger {
        &self.ledger
    }
}

fn warn_hazards(hazards: &[OpKind]) {
    for &op in hazards {
        metrics::unbounded_input(op);
    }
}

/// Wraps sources under one explicit configuration.
///
/// Every pipeline created through the same `Query` shares its ledger.
#[derive(Clone, Debug, Default)]
pub struct Query {
    ctx: Rc<Context>,
}

impl Query {
    pub fn new(config: QueryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ctx: Rc::new(Context {
                config,
                ledger: BufferLedger::new(),
            }),
        })
    }

    /// `QueryConfig::from_env` wrapped in a `Query`.
    pub fn from_env() -> Result<Self> {
        Self::new(QueryConfig::from_env()?)
    }

    pub fn config(&self) -> &QueryConfig {
        &self.ctx.config
    }

    pub fn ledger(&self) -> &BufferLedger {
        &self.ctx.ledger
    }

    /// Borrow a re-iterable container. Elements are `&'s` references into it.
    pub fn from_ref<'s, C>(&self, items: &'s C) -> Pipeline<'s, <&'s C as IntoIterator>::Item>
    where
        C: ?Sized,
        &'s C: IntoIterator,
        <&'s C as IntoIterator>::IntoIter: 's,
        <&'s C as IntoIterator>::Item: 's,
    {
        self.from_source(Borrowed::new(items))
    }

    /// Wrap a single-shot iterator. Only the first enumeration sees elements.
    pub fn once<'s, I>(&self, iter: I) -> Pipeline<'s, I::Item>
    where
        I: IntoIterator,
        I::IntoIter: 's,
        I::Item: 's,
    {
        self.from_source(OneShot::new(iter.into_iter()))
    }

    /// Wrap a factory called once per enumeration.
    pub fn generate<'s, F, I>(&self, factory: F) -> Pipeline<'s, I::Item>
    where
        F: Fn() -> I + 's,
        I: Iterator + 's,
        I::Item: 's,
    {
        self.from_source(Generated::new(factory))
    }

    pub fn from_source<'s, T: 's>(&self, source: impl Source<'s, T> + 's) -> Pipeline<'s, T> {
        Pipeline {
            node: Rc::new(Node::Source(Rc::new(source))),
            ctx: Rc::clone(&self.ctx),
        }
    }

    pub fn empty<'s, T: 's>(&self) -> Pipeline<'s, T> {
        self.from_source(OneShot::new(std::iter::empty()))
    }
}

pub struct Pipeline<'s, T> {
    pub(crate) node: Rc<Node<'s, T>>,
    pub(crate) ctx: Rc<Context>,
}

impl<'s, T> Clone for Pipeline<'s, T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
            ctx: Rc::clone(&self.ctx),
        }
    }
}

impl<'s, T: 's> Pipeline<'s, T> {
    /// `Query::default().from_ref(items)`.
    pub fn from_ref<C>(items: &'s C) -> Self
    where
        C: ?Sized,
        &'s C: IntoIterator<Item = T>,
        <&'s C as IntoIterator>::IntoIter: 's,
    {
        Query::default().from_ref(items)
    }

    /// `Query::default().once(iter)`.
    pub fn once<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 's,
    {
        Query::default().once(iter)
    }

    /// `Query::default().generate(factory)`.
    pub fn generate<F, I>(factory: F) -> Self
    where
        F: Fn() -> I + 's,
        I: Iterator<Item = T> + 's,
    {
        Query::default().generate(factory)
    }

    pub fn from_source(source: impl Source<'s, T> + 's) -> Self {
        Query::default().from_source(source)
    }

    pub fn empty() -> Self {
        Query::default().empty()
    }

    pub(crate) fn chain<U: 's>(&self, node: Node<'s, U>) -> Pipeline<'s, U> {
        Pipeline {
            node: Rc::new(node),
            ctx: Rc::clone(&self.ctx),
        }
    }

    pub(crate) fn stage<U: 's>(&self, stage: impl Stage<'s, U> + 's) -> Pipeline<'s, U> {
        self.chain(Node::Stage(Rc::new(stage)))
    }

    pub fn config(&self) -> &QueryConfig {
        &self.ctx.config
    }

    pub fn ledger(&self) -> &BufferLedger {
        &self.ctx.ledger
    }

    /// The operator DAG from this handle back to its source(s).
    pub fn explain(&self) -> PlanNode {
        self.node.plan()
    }

    /// Stable fingerprint of [`Pipeline::explain`].
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        fingerprint_serde(&self.explain())
    }

    /// Fail with `NonTerminating` if any draining operator in the chain sits
    /// on an input that reports itself infinite, whatever the config says.
    pub fn check_bounds(&self) -> Result<()> {
        match self.explain().hazards().first() {
            Some(op) => Err(Error::NonTerminating { op: op.name() }),
            None => Ok(()),
        }
    }

    /// Start an enumeration. Nothing is pulled until the first `next`.
    ///
    /// Unbounded-input hazards are only logged here, never raised; use
    /// [`Pipeline::try_iter`] to honor `strict_bounds`.
    pub fn iter(&self) -> Enumeration<'s, T> {
        warn_hazards(&self.bound_hazards(None));
        Enumeration::new(Rc::clone(&self.node), Rc::clone(&self.ctx))
    }

    /// Like [`Pipeline::iter`], but fails with `NonTerminating` under
    /// `strict_bounds` when a draining operator sits on an infinite input.
    pub fn try_iter(&self) -> Result<Enumeration<'s, T>> {
        self.inspect_bounds(None)?;
        Ok(Enumeration::new(Rc::clone(&self.node), Rc::clone(&self.ctx)))
    }

    /// Entry point for terminal evaluators.
    pub(crate) fn start(&self, terminal: OpKind) -> Result<Enumeration<'s, T>> {
        self.inspect_bounds(Some(terminal))?;
        Ok(Enumeration::new(Rc::clone(&self.node), Rc::clone(&self.ctx)))
    }

    /// Draining operators over infinite inputs, then `terminal` if it would
    /// exhaust an infinite chain.
    fn bound_hazards(&self, terminal: Option<OpKind>) -> Vec<OpKind> {
        let plan = self.explain();
        let mut hazards = plan.hazards();
        if let Some(op) = terminal {
            if op.exhausts_input() && plan.bounds == Bounds::Infinite {
                hazards.push(op);
            }
        }
        hazards
    }

    /// Raises the first hazard under `strict_bounds`, otherwise only logs.
    fn inspect_bounds(&self, terminal: Option<OpKind>) -> Result<()> {
        let hazards = self.bound_hazards(terminal);
        match hazards.first() {
            Some(op) if self.ctx.config.strict_bounds => Err(Error::NonTerminating { op: op.name() }),
            _ => {
                warn_hazards(&hazards);
                Ok(())
            }
        }
    }

    /// Elements satisfying `predicate`. Lazy.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 's) -> Self {
        self.chain(Node::Filter {
            input: Rc::clone(&self.node),
            predicate: Rc::new(predicate),
        })
    }

    /// Bypass the first `count` elements. Lazy.
    pub fn skip(&self, count: usize) -> Self {
        self.chain(Node::Skip {
            input: Rc::clone(&self.node),
            count,
        })
    }

    /// At most the first `count` elements; never pulls past the last one it
    /// yields. Lazy.
    pub fn take(&self, count: usize) -> Self {
        self.chain(Node::Take {
            input: Rc::clone(&self.node),
            count,
        })
    }

    pub fn skip_while(&self, predicate: impl Fn(&T) -> bool + 's) -> Self {
        self.chain(Node::SkipWhile {
            input: Rc::clone(&self.node),
            predicate: Rc::new(predicate),
        })
    }

    pub fn take_while(&self, predicate: impl Fn(&T) -> bool + 's) -> Self {
        self.chain(Node::TakeWhile {
            input: Rc::clone(&self.node),
            predicate: Rc::new(predicate),
        })
    }

    /// `self` followed by `tail`; `tail` is not opened until `self` runs dry.
    pub fn concat(&self, tail: &Pipeline<'s, T>) -> Self {
        self.chain(Node::Concat {
            input: Rc::clone(&self.node),
            tail: Rc::clone(&tail.node),
        })
    }

    pub fn append(&self, item: T) -> Self
    where
        T: Clone,
    {
        self.chain(Node::Append {
            input: Rc::clone(&self.node),
            item: Rc::new(move || item.clone()),
        })
    }

    pub fn prepend(&self, item: T) -> Self
    where
        T: Clone,
    {
        self.chain(Node::Prepend {
            input: Rc::clone(&self.node),
            item: Rc::new(move || item.clone()),
        })
    }

    /// The input, or just `item` if the input turns out empty.
    pub fn default_if_empty(&self, item: T) -> Self
    where
        T: Clone,
    {
        self.chain(Node::DefaultIfEmpty {
            input: Rc::clone(&self.node),
            item: Rc::new(move || item.clone()),
        })
    }
}

impl<'a, 's, T: 's> IntoIterator for &'a Pipeline<'s, T> {
    type Item = T;
    type IntoIter = Enumeration<'s, T>;

    fn into_iter(self) -> Enumeration<'s, T> {
        self.iter()
    }
}

impl<'s, T: 's> fmt::Debug for Pipeline<'s, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("plan", &self.explain())
            .field("config", self.config())
            .finish()
    }
}
