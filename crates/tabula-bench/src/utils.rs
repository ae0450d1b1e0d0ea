//! Benchmark utilities and helpers.

use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabula_common::{StoreConfig, TabulaResult, Value};
use tabula_core::{Column, Row, Table, TableRegistry};

/// Generates random string data for benchmarks.
pub fn random_string(rng: &mut StdRng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generates sequential, zero-padded keys.
pub fn generate_sequential_keys(count: usize, prefix: &str) -> Vec<String> {
    (0..count).map(|i| format!("{}{:08}", prefix, i)).collect()
}

/// Generates random `(name, price)` tuples.
pub fn generate_tuples(count: usize) -> Vec<Vec<Value>> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| {
            vec![
                Value::from(random_string(&mut rng, 2)),
                Value::Int(rng.gen_range(0..1000)),
            ]
        })
        .collect()
}

/// Creates a registry whose data directory is under the system temp dir.
pub fn bench_registry() -> TabulaResult<TableRegistry> {
    TableRegistry::new(StoreConfig::for_testing(&std::env::temp_dir()))
}

/// Creates `product(name, price)` filled with `count` random rows.
pub fn product_table(registry: &TableRegistry, count: usize) -> TabulaResult<Arc<Table>> {
    let table = registry.create_table("product", count.max(1))?;
    table.add_column(Column::string("name", 16))?;
    table.add_column(Column::int("price", 4))?;
    table.create()?;

    let keys = generate_sequential_keys(count, "p");
    for (key, tuple) in keys.iter().zip(generate_tuples(count)) {
        let mut row = Row::new();
        row.insert("name", tuple[0].clone());
        row.insert("price", tuple[1].clone());
        table.set(Some(key), row)?;
    }
    Ok(table)
}
