//! Plan descriptions, fingerprints and the unbounded-input policy.

mod test_sources;

use lazyseq::{
    Bounds, Eagerness, EngineState, Error, ErrorKind, OpKind, Pipeline, PlanNode, Query,
    QueryConfig,
};
use test_sources::{counted, naturals};

fn strict() -> Query {
    Query::new(QueryConfig::default().with_strict_bounds(true)).unwrap()
}

#[test]
fn test_explain_renders_chain() {
    let data = [1, 2, 3];
    let plan = Pipeline::from_ref(&data)
        .filter(|x| **x > 1)
        .order_by(|x| **x)
        .then_by_descending(|x| **x)
        .take(1)
        .explain();
    assert_eq!(
        plan.to_string(),
        "take [lazy, finite] 1\n  order_by [semi-eager, finite] asc, desc\n    filter [lazy, finite]\n      source [lazy, finite] borrowed\n"
    );
    assert_eq!(plan.depth(), 4);
}

#[test]
fn test_plan_serializes_to_json() {
    let data = [1, 2];
    let plan = Pipeline::from_ref(&data).reverse().explain();
    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["op"], "reverse");
    assert_eq!(json["eagerness"], "semi_eager");
    assert_eq!(json["inputs"][0]["detail"], "borrowed");
    let back: PlanNode = serde_json::from_value(json).unwrap();
    assert_eq!(back, plan);
}

#[test]
fn test_fingerprint_tracks_plan_shape() {
    let data = [1, 2, 3];
    let base = Pipeline::from_ref(&data);
    let a = base.skip(1).take(2).fingerprint().unwrap();
    let b = base.skip(1).take(2).fingerprint().unwrap();
    let c = base.skip(2).take(1).fingerprint().unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.short().len(), 12);
}

#[test]
fn test_strict_bounds_rejects_sort_of_infinite_source() {
    let query = strict();
    let (naturals, counter) = naturals(&query, Bounds::Infinite);
    let sorted = naturals.order_by(|x| *x).take(3);

    let err = sorted.to_vec().unwrap_err();
    assert_eq!(err, Error::NonTerminating { op: "order_by" });
    assert_eq!(err.kind(), ErrorKind::NonTerminating);
    assert!(sorted.try_iter().is_err());
    // plain iter only logs the hazard
    assert_eq!(sorted.iter().state(), EngineState::NotStarted);
    assert_eq!(counter.opens(), 0);
}

#[test]
fn test_strict_bounds_rejects_exhaustive_terminal() {
    let query = strict();
    let (naturals, _) = naturals(&query, Bounds::Infinite);
    assert_eq!(
        naturals.count().unwrap_err(),
        Error::NonTerminating { op: "count" }
    );
    // short-circuiting terminals and bounded prefixes stay allowed
    assert_eq!(naturals.first(), Ok(0));
    assert_eq!(naturals.take(4).count(), Ok(4));
    assert_eq!(naturals.any_where(|x| *x > 10), Ok(true));
}

#[test]
fn test_strict_bounds_sees_through_filtering_operators() {
    let query = strict();
    let (naturals, counter) = naturals(&query, Bounds::Infinite);

    let evens = naturals.filter(|x| x % 2 == 0);
    assert_eq!(evens.explain().bounds, Bounds::Infinite);
    assert_eq!(
        evens.order_by(|x| *x).check_bounds(),
        Err(Error::NonTerminating { op: "order_by" })
    );
    assert_eq!(
        evens.order_by(|x| *x).first().unwrap_err(),
        Error::NonTerminating { op: "order_by" }
    );
    assert_eq!(evens.count().unwrap_err(), Error::NonTerminating { op: "count" });

    let halves = naturals.map(|x| x / 2).distinct();
    assert_eq!(
        halves.order_by(|x| *x).to_vec().unwrap_err(),
        Error::NonTerminating { op: "order_by" }
    );
    let by_parity = naturals.distinct_by(|x| x % 2);
    assert_eq!(by_parity.to_vec().unwrap_err(), Error::NonTerminating { op: "to_vec" });
    let spread = naturals.flat_map(|x| vec![x; (x % 2) as usize]);
    assert_eq!(spread.count().unwrap_err(), Error::NonTerminating { op: "count" });
    assert_eq!(counter.opens(), 0);

    // a bounded prefix still lifts the hazard
    assert_eq!(evens.take(2).order_by(|x| *x).to_vec(), Ok(vec![0, 2]));
}

#[test]
fn test_union_and_join_keep_infinite_outer() {
    let query = strict();
    let (infinite, _) = naturals(&query, Bounds::Infinite);
    let (finite, _) = counted(&query, vec![1u64, 2]);

    let merged = finite.union(&infinite);
    assert_eq!(merged.explain().bounds, Bounds::Infinite);
    assert_eq!(merged.count().unwrap_err(), Error::NonTerminating { op: "count" });

    let joined = infinite.join(&finite, |o| *o, |i| *i, |o, _| *o);
    assert_eq!(joined.explain().bounds, Bounds::Infinite);
    assert_eq!(
        joined.order_by(|x| *x).check_bounds(),
        Err(Error::NonTerminating { op: "order_by" })
    );

    // take_while may end an infinite input, so it is not flagged
    let prefix = infinite.take_while(|x| *x < 3);
    assert_eq!(prefix.explain().bounds, Bounds::Unknown);
    assert_eq!(prefix.count(), Ok(3));
}

#[test]
fn test_join_hazard_only_on_inner_side() {
    let query = strict();
    let (infinite, _) = naturals(&query, Bounds::Infinite);
    let (finite, _) = counted(&query, vec![2u64, 3]);

    let streamed = infinite.join(&finite, |o| *o, |i| *i, |o, _| *o);
    assert_eq!(streamed.take(2).to_vec(), Ok(vec![2, 3]));

    let drained = finite.join(&infinite, |o| *o, |i| *i, |o, _| *o);
    assert_eq!(drained.first().unwrap_err(), Error::NonTerminating { op: "join" });
}

#[test]
fn test_lenient_config_still_flags_hazards() {
    let (naturals, _) = naturals(&Query::default(), Bounds::Infinite);
    let sorted = naturals.order_by(|x| *x);
    assert!(!sorted.config().strict_bounds);
    assert_eq!(sorted.explain().hazards(), vec![OpKind::OrderBy]);
    assert_eq!(
        sorted.check_bounds(),
        Err(Error::NonTerminating { op: "order_by" })
    );
    // unknown bounds are not a hazard
    let (unknown, _) = test_sources::naturals(&Query::default(), Bounds::Unknown);
    assert!(unknown.order_by(|x| *x).check_bounds().is_ok());
}

#[test]
fn test_config_is_inherited_by_derived_pipelines() {
    let query = strict();
    let data = [1, 2];
    let derived = query.from_ref(&data).map(|x| x + 1).distinct().skip(1);
    assert!(derived.config().strict_bounds);
    assert_eq!(derived.explain().eagerness, Eagerness::Lazy);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = QueryConfig::default().with_buffer_capacity_hint(usize::MAX);
    assert_eq!(Query::new(config).unwrap_err().kind(), ErrorKind::Config);

    let config = QueryConfig::from_lookup(|key| match key {
        "LAZYSEQ_STRICT_BOUNDS" => Some("true".to_string()),
        _ => None,
    })
    .unwrap();
    assert!(Query::new(config).unwrap().config().strict_bounds);
}
