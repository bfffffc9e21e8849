//! The enumeration engine: one transient forward cursor per consumption.
//!
//! State machine:
//!
//! ```text
//! NotStarted -> Pulling -> Yielding -> Pulling -> ... -> Exhausted
//! ```
//!
//! The cursor chain is only built on the first pull, so creating an
//! `Enumeration` is free. On exhaustion the chain is dropped at once, which
//! releases any buffers the draining operators were holding; dropping the
//! `Enumeration` early does the same.

use std::iter::FusedIterator;
use std::rc::Rc;

use crate::cursor::Cursor;
use crate::metrics;
use crate::node::Node;
use crate::pipeline::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    NotStarted,
    /// Inside `next`, waiting on upstream.
    Pulling,
    /// Handed an element to the consumer.
    Yielding,
    Exhausted,
}

pub struct Enumeration<'s, T> {
    state: EngineState,
    /// Taken on the first pull.
    root: Option<Rc<Node<'s, T>>>,
    ctx: Rc<Context>,
    cursor: Cursor<'s, T>,
    yielded: u64,
}

impl<'s, T: 's> Enumeration<'s, T> {
    pub(crate) fn new(root: Rc<Node<'s, T>>, ctx: Rc<Context>) -> Self {
        Self {
            state: EngineState::NotStarted,
            root: Some(root),
            ctx,
            cursor: Cursor::Done,
            yielded: 0,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Elements handed out so far.
    pub fn yielded(&self) -> u64 {
        self.yielded
    }
}

impl<'s, T: 's> Iterator for Enumeration<'s, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.state == EngineState::Exhausted {
            return None;
        }
        if let Some(root) = self.root.take() {
            metrics::enumeration_started();
            self.cursor = root.open(&self.ctx);
        }

        self.state = EngineState::Pulling;
        match self.cursor.next() {
            Some(x) => {
                self.state = EngineState::Yielding;
                self.yielded += 1;
                Some(x)
            }
            None => {
                self.state = EngineState::Exhausted;
                self.cursor = Cursor::Done;
                metrics::enumeration_finished(self.yielded);
                None
            }
        }
    }
}

impl<'s, T: 's> FusedIterator for Enumeration<'s, T> {}
