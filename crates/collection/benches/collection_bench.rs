//! Benchmarks for twofold-collection.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use twofold_collection::{
    AggregateSpec, CollectionConfig, ExtractFn, ReactiveCollection,
};

type Plain = ReactiveCollection<i64, i64, i64, i64>;

fn configs() -> [(&'static str, CollectionConfig); 3] {
    [
        ("plain", CollectionConfig::new()),
        ("ordered", CollectionConfig::new().with_ordered_index(true)),
        (
            "ordered_combined",
            CollectionConfig::new()
                .with_ordered_index(true)
                .with_combined_atomic(true),
        ),
    ]
}

fn bench_push_erase(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_erase");

    for (name, config) in configs() {
        let coll = Plain::with_default_totals(config);
        coll.push_batch((0..1000).map(|i| (i * 7919 % 1000, i)));

        group.bench_with_input(BenchmarkId::new("push_then_erase", name), &coll, |b, coll| {
            let mut p = 0i64;
            b.iter(|| {
                let id = coll.push_back(black_box(p % 1000), 1);
                coll.erase(id);
                p += 1;
            })
        });
    }

    group.finish();
}

fn bench_mutate(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutate");

    for (name, config) in configs() {
        let coll = Plain::with_default_totals(config);
        let ids = coll.push_batch((0..1000).map(|i| (i * 7919 % 1000, i)));

        group.bench_with_input(BenchmarkId::new("set_elem1", name), &coll, |b, coll| {
            let mut n = 0usize;
            b.iter(|| {
                let id = ids[n % ids.len()];
                coll.set_elem1(id, black_box((n * 31 % 1000) as i64)).ok();
                n += 1;
            })
        });
    }

    let extremes: Plain = ReactiveCollection::builder()
        .total1(AggregateSpec::min(ExtractFn::second()))
        .total2(AggregateSpec::max(ExtractFn::product()))
        .build()
        .expect("both totals given");
    let ids = extremes.push_batch((0..1000).map(|i| (1, i)));
    group.bench_function("set_elem2/min_max", |b| {
        let mut n = 0usize;
        b.iter(|| {
            let id = ids[n % ids.len()];
            extremes.set_elem2(id, black_box((n * 31 % 1000) as i64)).ok();
            n += 1;
        })
    });

    group.finish();
}

fn bench_batch_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_push");

    for size in [100, 1000, 10000] {
        group.bench_with_input(BenchmarkId::new("push_batch", size), &size, |b, &size| {
            b.iter(|| {
                let coll = Plain::with_default_totals(CollectionConfig::new());
                coll.push_batch((0..size).map(|i| (i, 1)));
                black_box(coll.total2())
            })
        });
    }

    group.finish();
}

fn bench_top_k(c: &mut Criterion) {
    let coll = Plain::with_default_totals(CollectionConfig::new().with_ordered_index(true));
    coll.push_batch((0..10000).map(|i| (i * 7919 % 10000, i)));

    c.bench_function("top_k/10_of_10000", |b| b.iter(|| black_box(coll.top_k(10))));
}

criterion_group!(benches, bench_push_erase, bench_mutate, bench_batch_push, bench_top_k);
criterion_main!(benches);
