use criterion::{criterion_group, criterion_main, Criterion};
use lazyseq::{BucketStrategy, NaturalEq, Pipeline, Query, QueryConfig};

fn make_rows(rows: usize) -> Vec<(u32, u64)> {
    (0..rows)
        .map(|i| ((i % 64) as u32, (i as u64 * 2_654_435_761) % 1_000))
        .collect()
}

fn bench_order_by(c: &mut Criterion) {
    let rows = make_rows(4096);
    c.bench_function("order_by_then_by", |b| {
        b.iter(|| {
            let _ = Pipeline::from_ref(&rows)
                .order_by(|r| r.0)
                .then_by_descending(|r| r.1)
                .to_vec()
                .unwrap();
        })
    });
}

fn bench_group_by(c: &mut Criterion) {
    let rows = make_rows(4096);
    let scan = Query::new(QueryConfig::default().with_bucketing(BucketStrategy::Scan)).unwrap();
    c.bench_function("group_by_hash", |b| {
        b.iter(|| {
            let _ = Pipeline::from_ref(&rows).group_by(|r| r.0).count().unwrap();
        })
    });
    c.bench_function("group_by_scan", |b| {
        b.iter(|| {
            let _ = scan
                .from_ref(&rows)
                .group_by_with(|r| r.0, NaturalEq)
                .count()
                .unwrap();
        })
    });
}

fn bench_join(c: &mut Criterion) {
    let outer = make_rows(2048);
    let inner: Vec<u32> = (0..64).collect();
    c.bench_function("join_hash", |b| {
        b.iter(|| {
            let _ = Pipeline::from_ref(&outer)
                .join(&Pipeline::from_ref(&inner), |o| o.0, |i| **i, |o, _| o.1)
                .sum::<u64>()
                .unwrap();
        })
    });
}

fn bench_lazy_chain(c: &mut Criterion) {
    c.bench_function("filter_map_take", |b| {
        b.iter(|| {
            let _ = Pipeline::generate(|| 0u64..)
                .filter(|x| x % 3 == 0)
                .map(|x| x * 2)
                .take(1_000)
                .sum::<u64>()
                .unwrap();
        })
    });
}

criterion_group!(pipelines, bench_order_by, bench_group_by, bench_join, bench_lazy_chain);
criterion_main!(pipelines);
