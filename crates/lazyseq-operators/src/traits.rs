//! Seams between the pipeline scaffolding and what it drives.

use std::rc::Rc;

use lazyseq_core::plan::{Bounds, PlanNode};

use crate::pipeline::Context;

/// A caller-supplied sequence.
///
/// The engine calls `open` once per enumeration, when that enumeration
/// receives its first pull, and calls `bounds` whenever it inspects a plan.
/// Neither may mutate the underlying data.
pub trait Source<'s, T> {
    /// Start a fresh forward iteration. Re-iterable sources hand out an
    /// independent iterator each time; single-shot sources may hand out an
    /// empty one after the first call.
    fn open(&self) -> Box<dyn Iterator<Item = T> + 's>;

    /// Self-reported boundedness. Must not pull elements.
    fn bounds(&self) -> Bounds;

    /// Short label for plan descriptions.
    fn label(&self) -> &'static str {
        "source"
    }
}

/// An operator whose output element type differs from its input's.
///
/// Stages hide their input element type behind this trait so the node enum
/// stays closed over one element type.
pub(crate) trait Stage<'s, T> {
    fn open(&self, ctx: &Rc<Context>) -> Box<dyn Iterator<Item = T> + 's>;

    fn plan(&self) -> PlanNode;
}
