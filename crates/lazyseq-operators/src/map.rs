//! Type-changing lazy operators. Each is a `Stage` over its input node(s);
//! every output pulls only as many input elements as it needs.

use std::rc::Rc;

use lazyseq_core::error::{Error, Result};
use lazyseq_core::plan::{Bounds, OpKind, PlanNode};

use crate::cursor::Cursor;
use crate::node::Node;
use crate::pipeline::{Context, Pipeline};
use crate::traits::Stage;

struct MapStage<'s, S, T> {
    input: Rc<Node<'s, S>>,
    f: Rc<dyn Fn(S) -> T + 's>,
}

impl<'s, S: 's, T: 's> Stage<'s, T> for MapStage<'s, S, T> {
    fn open(&self, ctx: &Rc<Context>) -> Box<dyn Iterator<Item = T> + 's> {
        let f = Rc::clone(&self.f);
        Box::new(self.input.open(ctx).map(move |x| f(x)))
    }

    fn plan(&self) -> PlanNode {
        PlanNode::unary(OpKind::Map, self.input.plan(), |b| b)
    }
}

struct FlatMapStage<'s, S, I> {
    input: Rc<Node<'s, S>>,
    f: Rc<dyn Fn(S) -> I + 's>,
}

impl<'s, S: 's, I> Stage<'s, I::Item> for FlatMapStage<'s, S, I>
where
    I: IntoIterator + 's,
    I::IntoIter: 's,
    I::Item: 's,
{
    fn open(&self, ctx: &Rc<Context>) -> Box<dyn Iterator<Item = I::Item> + 's> {
        let f = Rc::clone(&self.f);
        Box::new(self.input.open(ctx).flat_map(move |x| f(x)))
    }

    fn plan(&self) -> PlanNode {
        // any input element may expand to nothing or to an unbounded run
        PlanNode::unary(OpKind::FlatMap, self.input.plan(), |b| match b {
            Bounds::Infinite => Bounds::Infinite,
            _ => Bounds::Unknown,
        })
    }
}

struct ZipStage<'s, A, B, R> {
    left: Rc<Node<'s, A>>,
    right: Rc<Node<'s, B>>,
    f: Rc<dyn Fn(A, B) -> R + 's>,
}

impl<'s, A: 's, B: 's, R: 's> Stage<'s, R> for ZipStage<'s, A, B, R> {
    fn open(&self, ctx: &Rc<Context>) -> Box<dyn Iterator<Item = R> + 's> {
        let f = Rc::clone(&self.f);
        let mut left = self.left.open(ctx);
        let mut right = self.right.open(ctx);
        // left first, so an exhausted left never costs a right pull
        Box::new(std::iter::from_fn(move || {
            let a = left.next()?;
            let b = right.next()?;
            Some(f(a, b))
        }))
    }

    fn plan(&self) -> PlanNode {
        let left = self.left.plan();
        let right = self.right.plan();
        PlanNode::new(OpKind::Zip, left.bounds.lockstep(right.bounds))
            .with_input(left)
            .with_input(right)
    }
}

struct ScanStage<'s, T, A> {
    input: Rc<Node<'s, T>>,
    seed: A,
    f: Rc<dyn Fn(A, T) -> A + 's>,
}

impl<'s, T: 's, A: Clone + 's> Stage<'s, A> for ScanStage<'s, T, A> {
    fn open(&self, ctx: &Rc<Context>) -> Box<dyn Iterator<Item = A> + 's> {
        let f = Rc::clone(&self.f);
        Box::new(self.input.open(ctx).scan(self.seed.clone(), move |acc, x| {
            let next = f(acc.clone(), x);
            *acc = next.clone();
            Some(next)
        }))
    }

    fn plan(&self) -> PlanNode {
        PlanNode::unary(OpKind::Scan, self.input.plan(), |b| b)
    }
}

struct ChunkStage<'s, T> {
    input: Rc<Node<'s, T>>,
    size: usize,
}

struct Chunks<'s, T> {
    input: Cursor<'s, T>,
    size: usize,
}

impl<'s, T: 's> Iterator for Chunks<'s, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        let chunk: Vec<T> = self.input.by_ref().take(self.size).collect();
        (!chunk.is_empty()).then_some(chunk)
    }
}

impl<'s, T: 's> Stage<'s, Vec<T>> for ChunkStage<'s, T> {
    fn open(&self, ctx: &Rc<Context>) -> Box<dyn Iterator<Item = Vec<T>> + 's> {
        Box::new(Chunks {
            input: self.input.open(ctx),
            size: self.size,
        })
    }

    fn plan(&self) -> PlanNode {
        PlanNode::unary(OpKind::Chunk, self.input.plan(), |b| b).with_detail(self.size.to_string())
    }
}

impl<'s, S: 's> Pipeline<'s, S> {
    /// Project each element through `f`. Lazy; `f` runs once per pulled
    /// element.
    pub fn map<T: 's>(&self, f: impl Fn(S) -> T + 's) -> Pipeline<'s, T> {
        self.stage(MapStage {
            input: Rc::clone(&self.node),
            f: Rc::new(f),
        })
    }

    /// Project each element to a sequence and flatten. The next input
    /// element is only pulled once the current expansion runs dry.
    pub fn flat_map<I>(&self, f: impl Fn(S) -> I + 's) -> Pipeline<'s, I::Item>
    where
        I: IntoIterator + 's,
        I::IntoIter: 's,
        I::Item: 's,
    {
        self.stage(FlatMapStage {
            input: Rc::clone(&self.node),
            f: Rc::new(f),
        })
    }

    /// Pair elements positionally; stops with the shorter side.
    pub fn zip<B: 's>(&self, other: &Pipeline<'s, B>) -> Pipeline<'s, (S, B)> {
        self.zip_with(other, |a, b| (a, b))
    }

    pub fn zip_with<B: 's, R: 's>(
        &self,
        other: &Pipeline<'s, B>,
        f: impl Fn(S, B) -> R + 's,
    ) -> Pipeline<'s, R> {
        self.stage(ZipStage {
            left: Rc::clone(&self.node),
            right: Rc::clone(&other.node),
            f: Rc::new(f),
        })
    }

    /// Running fold: yields each intermediate accumulator, starting from
    /// `f(seed, first)`.
    pub fn scan<A: Clone + 's>(&self, seed: A, f: impl Fn(A, S) -> A + 's) -> Pipeline<'s, A> {
        self.stage(ScanStage {
            input: Rc::clone(&self.node),
            seed,
            f: Rc::new(f),
        })
    }

    /// Consecutive runs of `size` elements; the last run may be shorter.
    ///
    /// Fails with `InvalidArgument` when `size` is zero.
    pub fn chunk(&self, size: usize) -> Result<Pipeline<'s, Vec<S>>> {
        if size == 0 {
            return Err(Error::invalid_argument("size", "chunk size must be at least 1"));
        }
        Ok(self.stage(ChunkStage {
            input: Rc::clone(&self.node),
            size,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyseq_core::error::ErrorKind;

    #[test]
    fn test_map_and_flat_map() {
        let data = [1, 2, 3];
        let pipeline = Pipeline::from_ref(&data);
        let doubled: Vec<i32> = pipeline.map(|x| x * 2).iter().collect();
        assert_eq!(doubled, vec![2, 4, 6]);
        let repeated: Vec<i32> = pipeline.flat_map(|&x| std::iter::repeat(x).take(x as usize)).iter().collect();
        assert_eq!(repeated, vec![1, 2, 2, 3, 3, 3]);
    }

    #[test]
    fn test_zip_stops_with_shorter_side() {
        let left = [1, 2, 3];
        let right = ["a", "b"];
        let pairs: Vec<(i32, &str)> = Pipeline::from_ref(&left)
            .zip_with(&Pipeline::from_ref(&right), |a, b| (*a, *b))
            .iter()
            .collect();
        assert_eq!(pairs, vec![(1, "a"), (2, "b")]);
    }

    #[test]
    fn test_scan_yields_running_totals() {
        let data = [1, 2, 3, 4];
        let totals: Vec<i32> = Pipeline::from_ref(&data).scan(0, |acc, x| acc + x).iter().collect();
        assert_eq!(totals, vec![1, 3, 6, 10]);
    }

    #[test]
    fn test_chunk() {
        let data = [1, 2, 3, 4, 5];
        let chunks: Vec<Vec<i32>> = Pipeline::from_ref(&data)
            .map(|x| *x)
            .chunk(2)
            .unwrap()
            .iter()
            .collect();
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);

        let err = Pipeline::from_ref(&data).chunk(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_plan_for_zip_is_finite_when_either_side_is() {
        let data = [1, 2];
        let left = Pipeline::generate(|| 0..);
        let plan = left.zip(&Pipeline::from_ref(&data)).explain();
        assert_eq!(plan.op, OpKind::Zip);
        assert_eq!(plan.bounds, Bounds::Finite);
        assert_eq!(plan.inputs.len(), 2);
    }
}
