//! Index benchmarks for Tabula.
//!
//! Benchmarks for:
//! - Index inserts of random two-field tuples
//! - Equality and range probes
//! - Table writes with index maintenance

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tabula_bench::utils::{bench_registry, generate_sequential_keys, generate_tuples, product_table};
use tabula_common::Value;
use tabula_core::{Index, Operator, Row};

fn build_index(keys: &[String], tuples: &[Vec<Value>]) -> Index {
    let index = Index::new(
        "_INDEX_bench_name_price",
        vec!["name".to_string(), "price".to_string()],
        keys.len() + 1,
        256,
        64 * 1024,
    )
    .unwrap();
    for (key, tuple) in keys.iter().zip(tuples) {
        index.insert(key, tuple).unwrap();
    }
    index
}

/// Benchmark random tuple inserts.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("index/insert");
    group.sample_size(10);

    for size in [1000, 10_000].iter() {
        let keys = generate_sequential_keys(*size, "k");
        let tuples = generate_tuples(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(build_index(&keys, &tuples).node_count()));
        });
    }

    group.finish();
}

/// Benchmark probes against a populated index.
fn bench_get_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("index/get_keys");
    let keys = generate_sequential_keys(10_000, "k");
    let tuples = generate_tuples(10_000);
    let index = build_index(&keys, &tuples);
    let pivot = tuples[tuples.len() / 2].clone();

    group.bench_function("equal", |b| {
        b.iter(|| black_box(index.get_keys(Operator::Equal, &pivot).unwrap().len()));
    });
    group.bench_function("prefix", |b| {
        b.iter(|| black_box(index.get_keys(Operator::Equal, &pivot[..1]).unwrap().len()));
    });
    group.bench_function("inferior", |b| {
        b.iter(|| black_box(index.get_keys(Operator::Inferior, &pivot).unwrap().len()));
    });

    group.finish();
}

/// Benchmark table updates that move rows between index nodes.
fn bench_indexed_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("index/table_set");
    let registry = bench_registry().unwrap();
    let table = product_table(&registry, 5000).unwrap();
    table.add_index(&["price"]).unwrap();
    let keys = table.keys();

    group.bench_function("update_price", |b| {
        let mut i = 0usize;
        b.iter(|| {
            let key = &keys[i % keys.len()];
            i += 1;
            let price = (i % 1000) as i64;
            table
                .set(Some(key), Row::new().with("price", price))
                .unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_get_keys, bench_indexed_set);
criterion_main!(benches);
