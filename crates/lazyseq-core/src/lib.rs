#![forbid(unsafe_code)]
//! lazyseq-core: the vocabulary shared by every lazyseq crate.
//!
//! Nothing in here pulls from a sequence. Operators and the enumeration
//! engine live in `lazyseq-operators`; this crate only carries the pieces
//! they agree on (comparers, errors, config, buffer accounting, plan shape).

pub mod budget;
pub mod compare;
pub mod config;
pub mod error;
pub mod hash;
pub mod plan;
pub mod prelude;

pub use error::{Error, ErrorKind, Result};
