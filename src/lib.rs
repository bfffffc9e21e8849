#![forbid(unsafe_code)]
//! lazyseq: deferred-execution query pipelines.
//!
//! Wrap a sequence with [`Pipeline::from_ref`], [`Pipeline::once`],
//! [`Pipeline::generate`] or a [`Query`] carrying an explicit
//! [`QueryConfig`], chain operators, then call a terminal:
//!
//! ```
//! use lazyseq::Pipeline;
//!
//! let data = [3, 1, 2, 1];
//! let sorted = Pipeline::from_ref(&data).order_by(|x| **x).to_vec().unwrap();
//! assert_eq!(sorted, vec![&1, &1, &2, &3]);
//! ```
//!
//! Chaining never reads the source. `OpKind::eagerness` tells whether an
//! operator is lazy, drains an input on its first pull (semi-eager), or runs
//! right away (terminal).

pub use lazyseq_core::prelude::*;
pub use lazyseq_operators::{
    Borrowed, EngineState, Enumeration, Generated, Grouping, Lookup, OneShot, OrderedPipeline,
    Pipeline, Query, Source,
};
