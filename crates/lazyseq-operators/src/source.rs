//! Built-in sequence sources.
//!
//! None of these copy the caller's data. `Borrowed` and `Generated` are
//! re-iterable; `OneShot` is not, and a second enumeration of any pipeline
//! built on it observes an empty remainder. Preventing that is the caller's
//! job, not the engine's.

use std::cell::RefCell;

use lazyseq_core::plan::Bounds;

use crate::traits::Source;

/// A borrowed container; each enumeration iterates `&C` afresh.
pub struct Borrowed<'s, C: ?Sized> {
    items: &'s C,
}

impl<'s, C: ?Sized> Borrowed<'s, C> {
    pub fn new(items: &'s C) -> Self {
        Self { items }
    }
}

impl<'s, C> Source<'s, <&'s C as IntoIterator>::Item> for Borrowed<'s, C>
where
    C: ?Sized,
    &'s C: IntoIterator,
    <&'s C as IntoIterator>::IntoIter: 's,
{
    fn open(&self) -> Box<dyn Iterator<Item = <&'s C as IntoIterator>::Item> + 's> {
        Box::new(self.items.into_iter().fuse())
    }

    fn bounds(&self) -> Bounds {
        Bounds::from_size_hint(self.items.into_iter().size_hint())
    }

    fn label(&self) -> &'static str {
        "borrowed"
    }
}

/// A single-shot iterator. The first enumeration takes it; later ones see
/// nothing.
pub struct OneShot<I> {
    iter: RefCell<Option<I>>,
}

impl<I: Iterator> OneShot<I> {
    pub fn new(iter: I) -> Self {
        Self {
            iter: RefCell::new(Some(iter)),
        }
    }

    pub fn is_spent(&self) -> bool {
        self.iter.borrow().is_none()
    }
}

impl<'s, I> Source<'s, I::Item> for OneShot<I>
where
    I: Iterator + 's,
    I::Item: 's,
{
    fn open(&self) -> Box<dyn Iterator<Item = I::Item> + 's> {
        match self.iter.borrow_mut().take() {
            Some(iter) => Box::new(iter.fuse()),
            None => Box::new(std::iter::empty()),
        }
    }

    fn bounds(&self) -> Bounds {
        self.iter
            .borrow()
            .as_ref()
            .map_or(Bounds::Finite, |iter| Bounds::from_size_hint(iter.size_hint()))
    }

    fn label(&self) -> &'static str {
        "one_shot"
    }
}

/// A factory producing a fresh iterator per enumeration (a generator, a file
/// reopened per pass, ...). Bounds are whatever the caller declares.
pub struct Generated<F> {
    factory: F,
    bounds: Bounds,
}

impl<F> Generated<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            bounds: Bounds::Unknown,
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }
}

impl<'s, F, I> Source<'s, I::Item> for Generated<F>
where
    F: Fn() -> I,
    I: Iterator + 's,
{
    fn open(&self) -> Box<dyn Iterator<Item = I::Item> + 's> {
        Box::new((self.factory)().fuse())
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn label(&self) -> &'static str {
        "generated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrowed_reiterates_without_copying() {
        let data = vec![1, 2, 3];
        let src = Borrowed::new(&data);
        let a: Vec<&i32> = src.open().collect();
        let b: Vec<&i32> = src.open().collect();
        assert_eq!(a, b);
        assert!(std::ptr::eq(a[0], &data[0]));
        assert_eq!(src.bounds(), Bounds::Finite);
    }

    #[test]
    fn test_one_shot_is_spent_after_first_open() {
        let src = OneShot::new(0..);
        assert_eq!(src.bounds(), Bounds::Infinite);
        let first: Vec<i32> = src.open().take(2).collect();
        assert_eq!(first, vec![0, 1]);
        assert!(src.is_spent());
        assert_eq!(src.open().count(), 0);
        assert_eq!(src.bounds(), Bounds::Finite);
    }

    #[test]
    fn test_generated_declares_bounds() {
        let src = Generated::new(|| 0..3);
        assert_eq!(src.bounds(), Bounds::Unknown);
        assert_eq!(src.open().count(), 3);
        let src = src.with_bounds(Bounds::Finite);
        assert_eq!(src.bounds(), Bounds::Finite);
    }
}
