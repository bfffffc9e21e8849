//! Counting sources shared by the integration tests.
#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use lazyseq::{Bounds, Generated, Pipeline, Query, Source};

/// Tracks how often a source was opened and how many elements were pulled.
#[derive(Clone, Default)]
pub struct PullCounter {
    opens: Rc<Cell<usize>>,
    pulls: Rc<Cell<usize>>,
}

impl PullCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opens(&self) -> usize {
        self.opens.get()
    }

    pub fn pulls(&self) -> usize {
        self.pulls.get()
    }

    fn opened(&self) {
        self.opens.set(self.opens.get() + 1);
    }

    fn pulled(&self) {
        self.pulls.set(self.pulls.get() + 1);
    }
}

/// Re-iterable source over owned items that counts every pull.
pub struct Counted<T> {
    items: Rc<Vec<T>>,
    counter: PullCounter,
    bounds: Bounds,
}

impl<'s, T: Clone + 's> Source<'s, T> for Counted<T> {
    fn open(&self) -> Box<dyn Iterator<Item = T> + 's> {
        self.counter.opened();
        let items = Rc::clone(&self.items);
        let counter = self.counter.clone();
        Box::new((0..items.len()).map(move |i| {
            counter.pulled();
            items[i].clone()
        }))
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn label(&self) -> &'static str {
        "counted"
    }
}

pub fn counted<'s, T: Clone + 's>(query: &Query, items: Vec<T>) -> (Pipeline<'s, T>, PullCounter) {
    let counter = PullCounter::new();
    let source = Counted {
        items: Rc::new(items),
        counter: counter.clone(),
        bounds: Bounds::Finite,
    };
    (query.from_source(source), counter)
}

/// `0, 1, 2, ...` reporting the given bounds.
pub fn naturals<'s>(query: &Query, bounds: Bounds) -> (Pipeline<'s, u64>, PullCounter) {
    let counter = PullCounter::new();
    let tracked = counter.clone();
    let source = Generated::new(move || {
        tracked.opened();
        let pulls = tracked.clone();
        (0u64..).inspect(move |_| pulls.pulled())
    })
    .with_bounds(bounds);
    (query.from_source(source), counter)
}

/// An element tagged with its original position, for stability checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged {
    pub key: i32,
    pub pos: usize,
}

pub fn tagged(keys: &[i32]) -> Vec<Tagged> {
    keys.iter()
        .enumerate()
        .map(|(pos, &key)| Tagged { key, pos })
        .collect()
}
