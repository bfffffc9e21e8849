//! Buffered runs: drain the input on first pull, arrange, then walk.
//!
//! The buffer is accounted through a `BufferGuard` that lives exactly as long
//! as the run, so it is released on exhaustion, early stop, or unwinding.

use std::rc::Rc;

use lazyseq_core::budget::BufferGuard;
use lazyseq_core::plan::OpKind;

use crate::cursor::Cursor;
use crate::metrics;
use crate::pipeline::Context;

use super::keys::{stable_sort, SortKeys};

pub(crate) enum Arrange<'s, T> {
    Sort(SortKeys<'s, T>),
    Reverse,
}

impl<T> Arrange<'_, T> {
    fn op(&self) -> OpKind {
        match self {
            Arrange::Sort(_) => OpKind::OrderBy,
            Arrange::Reverse => OpKind::Reverse,
        }
    }
}

pub(crate) enum BufferedRun<'s, T> {
    Pending {
        input: Cursor<'s, T>,
        arrange: Arrange<'s, T>,
        ctx: Rc<Context>,
    },
    Ready {
        items: std::vec::IntoIter<T>,
        _guard: BufferGuard,
    },
}

impl<'s, T: 's> BufferedRun<'s, T> {
    pub(crate) fn pending(input: Cursor<'s, T>, arrange: Arrange<'s, T>, ctx: &Rc<Context>) -> Self {
        BufferedRun::Pending {
            input,
            arrange,
            ctx: Rc::clone(ctx),
        }
    }
}

impl<'s, T: 's> Iterator for BufferedRun<'s, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if let BufferedRun::Pending {
            input,
            arrange,
            ctx,
        } = self
        {
            let op = arrange.op();
            let mut guard = ctx.ledger().guard(op.name());
            let mut buf = Vec::with_capacity(ctx.config().buffer_capacity_hint);
            for x in input {
                buf.push(x);
                guard.grow(1);
            }
            metrics::drained(op, buf.len());

            let arranged = match arrange {
                Arrange::Sort(keys) => stable_sort(buf, keys),
                Arrange::Reverse => {
                    buf.reverse();
                    buf
                }
            };
            *self = BufferedRun::Ready {
                items: arranged.into_iter(),
                _guard: guard,
            };
        }

        match self {
            BufferedRun::Ready { items, .. } => items.next(),
            BufferedRun::Pending { .. } => None,
        }
    }
}
