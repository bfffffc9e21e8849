//! Convenient re-exports for downstream crates.

pub use crate::budget::{BufferGuard, BufferLedger};
pub use crate::compare::{
    Comparer, Equality, HashedBy, HashedEq, NaturalEq, NaturalOrder, PartialNaturalOrder, Reversed,
};
pub use crate::config::{BucketStrategy, QueryConfig};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::hash::Fingerprint;
pub use crate::plan::{Bounds, Eagerness, OpKind, PlanNode};
