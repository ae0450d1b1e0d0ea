//! Table fixtures.

use std::path::Path;
use std::sync::Arc;

use tabula_common::{StoreConfig, TabulaResult, Value};
use tabula_core::{Column, ForeignKeyDef, Row, Table, TableRegistry};
use tabula_query::{Condition, ConditionElement, ConditionOperator};

/// Creates a registry persisting under `dir`.
pub fn registry(dir: &Path) -> TabulaResult<TableRegistry> {
    TableRegistry::new(StoreConfig::for_testing(dir))
}

/// Creates `testSelect(name, price)` holding `0: john 12.5` and
/// `1: paul 34.9`.
pub fn test_select(registry: &TableRegistry) -> TabulaResult<Arc<Table>> {
    let table = registry.create_table("testSelect", 10)?;
    table
        .add_column(Column::string("name", 256))?
        .add_column(Column::float("price"))?;
    table.create()?;
    table.set(Some("0"), Row::new().with("name", "john").with("price", 12.5))?;
    table.set(Some("1"), Row::new().with("name", "paul").with("price", 34.9))?;
    Ok(table)
}

/// Creates `numbers(n)` with `count` rows keyed `000`, `001`, ...
pub fn numbers(registry: &TableRegistry, count: usize) -> TabulaResult<Arc<Table>> {
    let table = registry.create_table("numbers", count)?;
    table.add_column(Column::int("n", 4))?;
    table.create()?;
    for i in 0..count {
        table.set(Some(&format!("{i:03}")), Row::new().with("n", i as i64))?;
    }
    Ok(table)
}

/// Creates `user(name)` and `post(title, owner)` where `post.owner`
/// references the user key through the foreign key `owner`, reflected on
/// `user` as `posts`.
///
/// Users: `1: john`, `2: paul`. Posts: `a` by john, `b` and `c` by paul.
pub fn users_and_posts(registry: &TableRegistry) -> TabulaResult<(Arc<Table>, Arc<Table>)> {
    let user = registry.create_table("user", 100)?;
    user.add_column(Column::string("name", 64))?;
    user.create()?;

    let post = registry.create_table("post", 100)?;
    post.add_column(Column::string("title", 128))?
        .add_column(Column::string("owner", 64))?;
    post.create()?;
    post.add_foreign_key_def(ForeignKeyDef::new("owner", "user", "owner"))?;

    user.set(Some("1"), Row::new().with("name", "john"))?;
    user.set(Some("2"), Row::new().with("name", "paul"))?;
    post.set(Some("a"), Row::new().with("title", "hello").with("owner", "1"))?;
    post.set(Some("b"), Row::new().with("title", "rust").with("owner", "2"))?;
    post.set(Some("c"), Row::new().with("title", "trees").with("owner", "2"))?;
    Ok((user, post))
}

/// Builds `alias.field OP value`.
pub fn compare(
    alias: &str,
    field: &str,
    operator: ConditionOperator,
    value: impl Into<Value>,
) -> TabulaResult<Condition> {
    Condition::new(
        ConditionElement::var(field, alias)?,
        operator,
        Some(ConditionElement::constant(value)),
    )
}
