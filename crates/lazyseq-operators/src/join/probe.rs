//! Per-enumeration join state: build the inner index on the first pull, then
//! stream the outer side and probe.

use std::rc::Rc;

use lazyseq_core::budget::BufferGuard;
use lazyseq_core::compare::Equality;
use lazyseq_core::config::BucketStrategy;
use lazyseq_core::plan::OpKind;

use crate::bucket::BucketTable;
use crate::cursor::Cursor;
use crate::group::bucket_all;
use crate::metrics;
use crate::pipeline::Context;

pub(crate) type KeyFn<'s, T, K> = Rc<dyn Fn(&T) -> K + 's>;

/// Inner side of a join, drained into buckets on demand.
pub(crate) struct InnerIndex<'s, I, K> {
    pending: Option<(Cursor<'s, I>, KeyFn<'s, I, K>)>,
    table: BucketTable<'s, K, Vec<I>>,
    guard: BufferGuard,
    op: OpKind,
}

impl<'s, I: 's, K: 's> InnerIndex<'s, I, K> {
    pub(crate) fn pending(
        op: OpKind,
        inner: Cursor<'s, I>,
        key: KeyFn<'s, I, K>,
        eq: Rc<dyn Equality<K> + 's>,
        bucketing: BucketStrategy,
        ctx: &Rc<Context>,
    ) -> Self {
        Self {
            pending: Some((inner, key)),
            table: BucketTable::new(eq, bucketing),
            guard: ctx.ledger().guard(op.name()),
            op,
        }
    }

    fn build(&mut self) {
        if let Some((inner, key)) = self.pending.take() {
            bucket_all(inner, &*key, &|x: I| x, &mut self.table, &mut self.guard);
            metrics::drained(self.op, self.guard.elements());
            metrics::bucketed(self.op, self.table.len(), self.table.is_hashed());
        }
    }
}

pub(crate) struct JoinRun<'s, O, I, K, R> {
    outer: Cursor<'s, O>,
    outer_key: KeyFn<'s, O, K>,
    index: InnerIndex<'s, I, K>,
    result: Rc<dyn Fn(&O, &I) -> R + 's>,
    /// Outer element being expanded: (element, bucket, next inner position).
    current: Option<(O, usize, usize)>,
}

impl<'s, O: 's, I: 's, K: 's, R: 's> JoinRun<'s, O, I, K, R> {
    pub(crate) fn new(
        outer: Cursor<'s, O>,
        outer_key: KeyFn<'s, O, K>,
        index: InnerIndex<'s, I, K>,
        result: Rc<dyn Fn(&O, &I) -> R + 's>,
    ) -> Self {
        Self {
            outer,
            outer_key,
            index,
            result,
            current: None,
        }
    }
}

impl<'s, O: 's, I: 's, K: 's, R: 's> Iterator for JoinRun<'s, O, I, K, R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        self.index.build();
        // nothing can match, so the outer side is never pulled
        if self.index.table.is_empty() {
            return None;
        }

        loop {
            if let Some((o, at, pos)) = &mut self.current {
                let bucket = self.index.table.value(*at);
                if let Some(i) = bucket.get(*pos) {
                    *pos += 1;
                    return Some((self.result)(o, i));
                }
                self.current = None;
            }

            let o = self.outer.next()?;
            if let Some(at) = self.index.table.position(&(self.outer_key)(&o)) {
                self.current = Some((o, at, 0));
            }
        }
    }
}

pub(crate) struct GroupJoinRun<'s, O, I, K, R> {
    outer: Cursor<'s, O>,
    outer_key: KeyFn<'s, O, K>,
    index: InnerIndex<'s, I, K>,
    result: Rc<dyn Fn(O, &[I]) -> R + 's>,
}

impl<'s, O: 's, I: 's, K: 's, R: 's> GroupJoinRun<'s, O, I, K, R> {
    pub(crate) fn new(
        outer: Cursor<'s, O>,
        outer_key: KeyFn<'s, O, K>,
        index: InnerIndex<'s, I, K>,
        result: Rc<dyn Fn(O, &[I]) -> R + 's>,
    ) -> Self {
        Self {
            outer,
            outer_key,
            index,
            result,
        }
    }
}

impl<'s, O: 's, I: 's, K: 's, R: 's> Iterator for GroupJoinRun<'s, O, I, K, R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        self.index.build();
        let o = self.outer.next()?;
        let matches = self
            .index
            .table
            .get(&(self.outer_key)(&o))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Some((self.result)(o, matches))
    }
}
