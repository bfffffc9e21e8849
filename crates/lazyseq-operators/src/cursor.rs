//! Per-enumeration cursors: the single recursive pull function.
//!
//! Each cursor mirrors the node it was opened from and owns that operator's
//! per-enumeration state. Any cursor that reports `None` turns into
//! `Cursor::Done`, which drops its upstream chain (and any buffers in it) and
//! keeps every later pull at `None` without touching the source again.

use std::rc::Rc;

use crate::node::{Node, Predicate, Producer};
use crate::pipeline::Context;
use crate::set::SetCursor;
use crate::sort::run::BufferedRun;

pub(crate) enum Cursor<'s, T> {
    /// Source iterators and type-changing stages.
    Iter(Box<dyn Iterator<Item = T> + 's>),
    Filter {
        input: Box<Cursor<'s, T>>,
        predicate: Predicate<'s, T>,
    },
    Skip {
        input: Box<Cursor<'s, T>>,
        remaining: usize,
    },
    Take {
        input: Box<Cursor<'s, T>>,
        remaining: usize,
    },
    SkipWhile {
        input: Box<Cursor<'s, T>>,
        /// `None` once the first element got through.
        predicate: Option<Predicate<'s, T>>,
    },
    TakeWhile {
        input: Box<Cursor<'s, T>>,
        predicate: Predicate<'s, T>,
    },
    Concat {
        head: Box<Cursor<'s, T>>,
        /// Opened only after `head` runs dry.
        tail: Option<Rc<Node<'s, T>>>,
        ctx: Rc<Context>,
    },
    Append {
        input: Box<Cursor<'s, T>>,
        item: Option<Producer<'s, T>>,
    },
    Prepend {
        item: Option<Producer<'s, T>>,
        input: Box<Cursor<'s, T>>,
    },
    DefaultIfEmpty {
        input: Box<Cursor<'s, T>>,
        /// `None` once the input produced anything.
        item: Option<Producer<'s, T>>,
    },
    Set(Box<SetCursor<'s, T>>),
    Buffered(Box<BufferedRun<'s, T>>),
    Done,
}

impl<'s, T: 's> Iterator for Cursor<'s, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            let out = match self {
                Cursor::Iter(iter) => iter.next(),
                Cursor::Filter { input, predicate } => loop {
                    match input.next() {
                        Some(x) if predicate(&x) => break Some(x),
                        Some(_) => continue,
                        None => break None,
                    }
                },
                Cursor::Skip { input, remaining } => {
                    while *remaining > 0 && input.next().is_some() {
                        *remaining -= 1;
                    }
                    input.next()
                }
                Cursor::Take { input, remaining } => {
                    if *remaining == 0 {
                        None
                    } else {
                        *remaining -= 1;
                        input.next()
                    }
                }
                Cursor::SkipWhile { input, predicate } => loop {
                    let Some(x) = input.next() else {
                        break None;
                    };
                    match predicate {
                        Some(p) if p(&x) => continue,
                        _ => {
                            *predicate = None;
                            break Some(x);
                        }
                    }
                },
                Cursor::TakeWhile { input, predicate } => input.next().filter(|x| predicate(x)),
                Cursor::Concat { head, tail, ctx } => match head.next() {
                    Some(x) => Some(x),
                    None => match tail.take() {
                        Some(node) => {
                            let next = node.open(ctx);
                            *self = next;
                            continue;
                        }
                        None => None,
                    },
                },
                Cursor::Append { input, item } => match input.next() {
                    Some(x) => Some(x),
                    None => item.take().map(|make| make()),
                },
                Cursor::Prepend { item, input } => match item.take() {
                    Some(make) => Some(make()),
                    None => input.next(),
                },
                Cursor::DefaultIfEmpty { input, item } => match input.next() {
                    Some(x) => {
                        *item = None;
                        Some(x)
                    }
                    None => item.take().map(|make| make()),
                },
                Cursor::Set(set) => set.next(),
                Cursor::Buffered(run) => run.next(),
                Cursor::Done => None,
            };
            if out.is_none() {
                *self = Cursor::Done;
            }
            return out;
        }
    }
}
