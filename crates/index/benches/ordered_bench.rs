//! Benchmarks for twofold-index using criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;
use twofold_core::ElemId;
use twofold_index::{FieldComparator, Order, OrderedIndex, SnapshotLookup};

struct Fields(HashMap<ElemId, (i64, i64)>);

impl SnapshotLookup<i64, i64> for Fields {
    fn snapshot(&self, id: ElemId) -> Option<(i64, i64)> {
        self.0.get(&id).copied()
    }
}

fn populated(size: u64) -> (OrderedIndex<i64, i64>, Fields) {
    let fields = Fields(
        (1..=size)
            .map(|n| (ElemId::new(n), ((n * 7919 % 1000) as i64, n as i64)))
            .collect(),
    );
    let index = OrderedIndex::new(FieldComparator::lexicographic());
    {
        let mut w = index.write();
        for (&id, pair) in &fields.0 {
            w.insert(id, *pair);
        }
    }
    (index, fields)
}

fn ordered_insert_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordered_insert");

    for size in [100u64, 1000, 10000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| black_box(populated(size)));
        });
    }

    group.finish();
}

fn ordered_reposition_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordered_reposition");

    for size in [100u64, 1000, 10000, 100_000] {
        let (index, mut fields) = populated(size);
        let id = ElemId::new(size / 2);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            let mut flip = false;
            b.iter(|| {
                let old = fields.0[&id];
                let new = if flip { (0, 0) } else { (999, 0) };
                flip = !flip;
                fields.0.insert(id, new);
                black_box(index.write().reposition(id, &old, &new, &fields));
            });
        });
    }

    group.finish();
}

fn ordered_top_k_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordered_top_k_10");

    for size in [10000u64, 100_000] {
        let (index, _fields) = populated(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(index.top_k(10)))
        });
    }

    group.finish();
}

fn ordered_set_compare_benchmark(c: &mut Criterion) {
    let (index, fields) = populated(10000);

    c.bench_function("ordered_set_compare_10000", |b| {
        let mut desc = false;
        b.iter(|| {
            let order = if desc { Order::Desc } else { Order::Asc };
            desc = !desc;
            index
                .write()
                .set_compare(FieldComparator::by(order, Order::Asc), &fields);
        });
    });
}

criterion_group!(
    benches,
    ordered_insert_benchmark,
    ordered_reposition_benchmark,
    ordered_top_k_benchmark,
    ordered_set_compare_benchmark
);
criterion_main!(benches);
