//! Operator classification and the inspectable plan description.
//!
//! `OpKind::eagerness` is part of the public contract: a caller can tell from
//! the operator alone whether calling it is free (`Lazy`), free until the
//! first pull (`SemiEager`), or drives the source right away (`Eager`).

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eagerness {
    /// Returns a new pipeline; each output pulls the minimal upstream prefix.
    Lazy,
    /// Returns a new pipeline; the first pull drains (one of) its inputs.
    SemiEager,
    /// Terminal evaluator; runs the enumeration immediately.
    Eager,
}

/// Whether a sequence is known to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bounds {
    Finite,
    Unknown,
    Infinite,
}

impl Bounds {
    /// Read boundedness off an iterator's `size_hint` without pulling from it.
    pub fn from_size_hint(hint: (usize, Option<usize>)) -> Self {
        match hint {
            (_, Some(_)) => Bounds::Finite,
            (usize::MAX, None) => Bounds::Infinite,
            _ => Bounds::Unknown,
        }
    }

    /// Bounds after an operator that may stop pulling before its input ends.
    ///
    /// Dropping elements is not enough: a filter over an infinite input
    /// still never ends when drained.
    pub fn weakened(self) -> Self {
        match self {
            Bounds::Infinite => Bounds::Unknown,
            other => other,
        }
    }

    /// Bounds of `self` followed by `other`.
    pub fn chain(self, other: Bounds) -> Self {
        match (self, other) {
            (Bounds::Infinite, _) | (_, Bounds::Infinite) => Bounds::Infinite,
            (Bounds::Finite, Bounds::Finite) => Bounds::Finite,
            _ => Bounds::Unknown,
        }
    }

    /// Bounds of two sequences pulled in lockstep.
    pub fn lockstep(self, other: Bounds) -> Self {
        match (self, other) {
            (Bounds::Finite, _) | (_, Bounds::Finite) => Bounds::Finite,
            (Bounds::Infinite, Bounds::Infinite) => Bounds::Infinite,
            _ => Bounds::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Source,

    // lazy
    Map,
    FlatMap,
    Filter,
    Skip,
    Take,
    SkipWhile,
    TakeWhile,
    Concat,
    Append,
    Prepend,
    Zip,
    Distinct,
    DistinctBy,
    Union,
    DefaultIfEmpty,
    Scan,
    Chunk,

    // semi-eager
    OrderBy,
    Reverse,
    GroupBy,
    Join,
    GroupJoin,
    Intersect,
    Except,

    // terminal
    Count,
    First,
    Last,
    Single,
    ElementAt,
    Any,
    All,
    Contains,
    Aggregate,
    Sum,
    Min,
    Max,
    Average,
    SequenceEqual,
    ToVec,
    ToSet,
    ToMap,
    ToLookup,
}

impl OpKind {
    pub const fn eagerness(self) -> Eagerness {
        use OpKind::*;
        match self {
            Source | Map | FlatMap | Filter | Skip | Take | SkipWhile | TakeWhile | Concat
            | Append | Prepend | Zip | Distinct | DistinctBy | Union | DefaultIfEmpty | Scan
            | Chunk => Eagerness::Lazy,
            OrderBy | Reverse | GroupBy | Join | GroupJoin | Intersect | Except => {
                Eagerness::SemiEager
            }
            Count | First | Last | Single | ElementAt | Any | All | Contains | Aggregate | Sum
            | Min | Max | Average | SequenceEqual | ToVec | ToSet | ToMap | ToLookup => {
                Eagerness::Eager
            }
        }
    }

    /// Input positions this operator drains completely on its first pull.
    pub const fn drained_inputs(self) -> &'static [usize] {
        use OpKind::*;
        match self {
            OrderBy | Reverse | GroupBy => &[0],
            Join | GroupJoin | Intersect | Except => &[1],
            _ => &[],
        }
    }

    /// Terminals that must see every element before answering.
    pub const fn exhausts_input(self) -> bool {
        use OpKind::*;
        matches!(
            self,
            Count
                | Last
                | Aggregate
                | Sum
                | Min
                | Max
                | Average
                | ToVec
                | ToSet
                | ToMap
                | ToLookup
        )
    }

    pub const fn name(self) -> &'static str {
        use OpKind::*;
        match self {
            Source => "source",
            Map => "map",
            FlatMap => "flat_map",
            Filter => "filter",
            Skip => "skip",
            Take => "take",
            SkipWhile => "skip_while",
            TakeWhile => "take_while",
            Concat => "concat",
            Append => "append",
            Prepend => "prepend",
            Zip => "zip",
            Distinct => "distinct",
            DistinctBy => "distinct_by",
            Union => "union",
            DefaultIfEmpty => "default_if_empty",
            Scan => "scan",
            Chunk => "chunk",
            OrderBy => "order_by",
            Reverse => "reverse",
            GroupBy => "group_by",
            Join => "join",
            GroupJoin => "group_join",
            Intersect => "intersect",
            Except => "except",
            Count => "count",
            First => "first",
            Last => "last",
            Single => "single",
            ElementAt => "element_at",
            Any => "any",
            All => "all",
            Contains => "contains",
            Aggregate => "aggregate",
            Sum => "sum",
            Min => "min",
            Max => "max",
            Average => "average",
            SequenceEqual => "sequence_equal",
            ToVec => "to_vec",
            ToSet => "to_set",
            ToMap => "to_map",
            ToLookup => "to_lookup",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One node of a pipeline's operator DAG, as seen from its terminal end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanNode {
    pub op: OpKind,
    pub eagerness: Eagerness,
    /// Bounds of this node's output.
    pub bounds: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<PlanNode>,
}

impl PlanNode {
    pub fn new(op: OpKind, bounds: Bounds) -> Self {
        Self {
            op,
            eagerness: op.eagerness(),
            bounds,
            detail: None,
            inputs: vec![],
        }
    }

    /// Node over one input; output bounds derived by `bounds`.
    pub fn unary(op: OpKind, input: PlanNode, bounds: impl FnOnce(Bounds) -> Bounds) -> Self {
        let b = bounds(input.bounds);
        Self::new(op, b).with_input(input)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_input(mut self, input: PlanNode) -> Self {
        self.inputs.push(input);
        self
    }

    /// Number of nodes on the longest source-to-terminal path.
    pub fn depth(&self) -> usize {
        1 + self.inputs.iter().map(PlanNode::depth).max().unwrap_or(0)
    }

    /// Draining operators whose drained input reports itself infinite,
    /// in source-to-terminal order.
    pub fn hazards(&self) -> Vec<OpKind> {
        let mut out = Vec::new();
        self.collect_hazards(&mut out);
        out
    }

    fn collect_hazards(&self, out: &mut Vec<OpKind>) {
        for input in &self.inputs {
            input.collect_hazards(out);
        }
        let unbounded = self
            .op
            .drained_inputs()
            .iter()
            .filter_map(|&i| self.inputs.get(i))
            .any(|input| input.bounds == Bounds::Infinite);
        if unbounded {
            out.push(self.op);
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let eagerness = match self.eagerness {
            Eagerness::Lazy => "lazy",
            Eagerness::SemiEager => "semi-eager",
            Eagerness::Eager => "eager",
        };
        let bounds = match self.bounds {
            Bounds::Finite => "finite",
            Bounds::Unknown => "unknown",
            Bounds::Infinite => "infinite",
        };
        write!(f, "{:indent$}{} [{eagerness}, {bounds}]", "", self.op)?;
        if let Some(detail) = &self.detail {
            write!(f, " {detail}")?;
        }
        writeln!(f)?;
        for input in &self.inputs {
            input.render(f, indent + 2)?;
        }
        Ok(())
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(OpKind::Filter.eagerness(), Eagerness::Lazy);
        assert_eq!(OpKind::Take.eagerness(), Eagerness::Lazy);
        assert_eq!(OpKind::OrderBy.eagerness(), Eagerness::SemiEager);
        assert_eq!(OpKind::Join.eagerness(), Eagerness::SemiEager);
        assert_eq!(OpKind::Count.eagerness(), Eagerness::Eager);
        assert!(OpKind::ToVec.exhausts_input());
        assert!(!OpKind::First.exhausts_input());
    }

    #[test]
    fn test_bounds_from_size_hint() {
        assert_eq!(Bounds::from_size_hint((0..).size_hint()), Bounds::Infinite);
        assert_eq!(Bounds::from_size_hint([1, 2].iter().size_hint()), Bounds::Finite);
        assert_eq!(Bounds::from_size_hint((0, None)), Bounds::Unknown);
    }

    #[test]
    fn test_bounds_combinators() {
        assert_eq!(Bounds::Finite.chain(Bounds::Infinite), Bounds::Infinite);
        assert_eq!(Bounds::Finite.chain(Bounds::Unknown), Bounds::Unknown);
        assert_eq!(Bounds::Infinite.lockstep(Bounds::Finite), Bounds::Finite);
        assert_eq!(Bounds::Infinite.lockstep(Bounds::Infinite), Bounds::Infinite);
        assert_eq!(Bounds::Infinite.weakened(), Bounds::Unknown);
    }

    #[test]
    fn test_hazards_follow_drained_inputs() {
        let infinite = PlanNode::new(OpKind::Source, Bounds::Infinite);
        let finite = PlanNode::new(OpKind::Source, Bounds::Finite);

        let sorted = PlanNode::unary(OpKind::OrderBy, infinite.clone(), |b| b);
        let taken = PlanNode::unary(OpKind::Take, sorted, |_| Bounds::Finite);
        assert_eq!(taken.hazards(), vec![OpKind::OrderBy]);

        // join streams its outer input and drains only the inner one
        let join = PlanNode::new(OpKind::Join, Bounds::Unknown)
            .with_input(infinite.clone())
            .with_input(finite.clone());
        assert!(join.hazards().is_empty());
        let join = PlanNode::new(OpKind::Join, Bounds::Unknown)
            .with_input(finite)
            .with_input(infinite);
        assert_eq!(join.hazards(), vec![OpKind::Join]);
    }

    #[test]
    fn test_render_indents_inputs() {
        let plan = PlanNode::unary(
            OpKind::Take,
            PlanNode::new(OpKind::Source, Bounds::Infinite),
            |_| Bounds::Finite,
        )
        .with_detail("3");
        let text = plan.to_string();
        assert_eq!(text, "take [lazy, finite] 3\n  source [lazy, infinite]\n");
        assert_eq!(plan.depth(), 2);
    }
}
