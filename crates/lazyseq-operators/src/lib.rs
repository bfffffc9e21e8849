#![forbid(unsafe_code)]
//! lazyseq-operators: deferred operators over borrowed or single-shot sequences.
//!
//! Design intent:
//! - Chaining is O(1) and never touches the source; it only allocates a node.
//! - The operator set is closed (`node::Node`), with one `Stage` seam for
//!   operators that change the element type.
//! - Enumeration is single-threaded and pull-based; buffers held by draining
//!   operators are accounted through the pipeline's `BufferLedger`.

mod bucket;
mod cursor;
mod join;
mod map;
mod metrics;
mod node;
mod set;
mod terminal;

pub mod engine;
pub mod group;
pub mod pipeline;
pub mod sort;
pub mod source;
pub mod traits;

pub use engine::{EngineState, Enumeration};
pub use group::{Grouping, Lookup};
pub use pipeline::{Context, Pipeline, Query};
pub use sort::OrderedPipeline;
pub use source::{Borrowed, Generated, OneShot};
pub use traits::Source;
