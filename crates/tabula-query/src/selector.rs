//! Table selector.
//!
//! ```text
//! execute()
//!   │
//!   ├─ 1. plan     where-clause index filters on the driving alias
//!   │              ├─ some index applies → Table::filter_with_index
//!   │              └─ otherwise          → full scan
//!   ├─ 2. expand   one ResultTree per candidate, joins in declaration order
//!   ├─ 3. flatten  one row combination per leaf path
//!   ├─ 4. filter   inner-join aliases present, full where clause holds
//!   ├─ 5. order    stable sort, first clause first
//!   └─ 6. window   limit(offset, length) or paginate(page, size)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tabula_common::{TabulaError, TabulaResult, Value, KEY_COLUMN_NAME};
use tabula_core::{RecordCollection, Resultset, Table, TableRegistry};
use tracing::debug;

use crate::bracket::Bracket;
use crate::join::{Join, JoinType};
use crate::order_by::{self, OrderByField, OrderDirection};
use crate::result_tree::ResultTree;

/// Row window applied after ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Window {
    Limit { offset: usize, length: usize },
    Page { page: usize, size: usize },
}

impl Window {
    fn bounds(self) -> (usize, usize) {
        match self {
            Window::Limit { offset, length } => (offset, length),
            Window::Page { page, size } => (size.saturating_mul(page - 1), size),
        }
    }
}

/// A select over a driving table, its joins, a where clause, an ordering
/// and a row window.
///
/// Join and ordering mistakes are reported when they are declared; data
/// errors surface from `execute`.
#[derive(Debug, Clone)]
pub struct TableSelector {
    table: Arc<Table>,
    alias: String,
    tables: HashMap<String, Arc<Table>>,
    joins: Vec<Join>,
    where_clause: Bracket,
    order_by: Vec<OrderByField>,
    window: Option<Window>,
}

impl TableSelector {
    /// Creates a selector over `from`, aliased as `alias` or the table name.
    pub fn new(registry: &TableRegistry, from: &str, alias: Option<&str>) -> TabulaResult<Self> {
        let table = registry.get_table(from)?;
        let alias = alias.unwrap_or(from).to_string();
        let mut tables = HashMap::new();
        tables.insert(alias.clone(), Arc::clone(&table));

        Ok(Self {
            table,
            alias,
            tables,
            joins: Vec::new(),
            where_clause: Bracket::new(),
            order_by: Vec::new(),
            window: None,
        })
    }

    /// Returns the alias of the driving table.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns the driving table.
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Returns the declared joins.
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    // =========================================================================
    // Declaration
    // =========================================================================

    /// Declares an inner join through `foreign_key` of the table bound to
    /// `from_alias`. The alias defaults to the foreign-key name.
    pub fn join(
        &mut self,
        from_alias: &str,
        foreign_key: &str,
        alias: Option<&str>,
    ) -> TabulaResult<&mut Self> {
        self.add_join(from_alias, foreign_key, alias, JoinType::Inner)
    }

    /// Declares a left join, keeping rows without partner.
    pub fn left_join(
        &mut self,
        from_alias: &str,
        foreign_key: &str,
        alias: Option<&str>,
    ) -> TabulaResult<&mut Self> {
        self.add_join(from_alias, foreign_key, alias, JoinType::Left)
    }

    fn add_join(
        &mut self,
        from_alias: &str,
        foreign_key: &str,
        alias: Option<&str>,
        join_type: JoinType,
    ) -> TabulaResult<&mut Self> {
        let alias = alias.unwrap_or(foreign_key);
        if self.tables.contains_key(alias) {
            return Err(TabulaError::syntax(format!("alias '{alias}' is already used")));
        }
        let from_table = self
            .tables
            .get(from_alias)
            .cloned()
            .ok_or_else(|| TabulaError::syntax(format!("unknown alias '{from_alias}' to join from")))?;

        let join = Join::new(from_alias, from_table, foreign_key, alias, join_type)?;
        self.tables
            .insert(alias.to_string(), Arc::clone(join.to_table()));
        self.joins.push(join);
        Ok(self)
    }

    /// Returns the root where clause.
    pub fn where_clause(&self) -> &Bracket {
        &self.where_clause
    }

    /// Returns the root where clause for building.
    pub fn where_mut(&mut self) -> &mut Bracket {
        &mut self.where_clause
    }

    /// Appends an ordering clause on `alias.field`.
    pub fn add_order_by(
        &mut self,
        field: &str,
        alias: &str,
        direction: OrderDirection,
    ) -> TabulaResult<&mut Self> {
        let table = self
            .tables
            .get(alias)
            .ok_or_else(|| TabulaError::syntax(format!("unknown alias '{alias}' to order by")))?;
        if field != KEY_COLUMN_NAME && !table.has_field(field) {
            return Err(TabulaError::syntax(format!(
                "table '{}' aliased '{alias}' has no field '{field}' to order by",
                table.name()
            )));
        }
        self.order_by
            .push(OrderByField::new(field, alias, direction));
        Ok(self)
    }

    /// Returns page `page` (1-based) of `size` rows. Replaces any limit.
    pub fn paginate(&mut self, page: usize, size: usize) -> TabulaResult<&mut Self> {
        if page == 0 {
            return Err(TabulaError::syntax("pages are numbered from 1"));
        }
        self.window = Some(Window::Page { page, size });
        Ok(self)
    }

    /// Returns `length` rows after skipping `offset`. Replaces any page.
    pub fn limit(&mut self, offset: usize, length: usize) -> &mut Self {
        self.window = Some(Window::Limit { offset, length });
        self
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Runs the select.
    pub fn execute(&self) -> TabulaResult<Resultset> {
        let optimisations = self.where_clause.get_optimisations(&self.tables);
        let candidates = match optimisations.get(&self.alias) {
            Some(filters) if self.table.can_filter_with_index(filters) => {
                let records = self.table.filter_with_index(filters)?;
                debug!(
                    table = %self.table.name(),
                    alias = %self.alias,
                    filters = filters.len(),
                    candidates = records.len(),
                    "index scan"
                );
                records
            }
            _ => {
                let records = self.table.records()?;
                debug!(
                    table = %self.table.name(),
                    alias = %self.alias,
                    candidates = records.len(),
                    "full scan"
                );
                records
            }
        };

        let required: Vec<&str> = self
            .joins
            .iter()
            .filter(|join| join.join_type() == JoinType::Inner)
            .map(Join::alias)
            .collect();

        let mut rows = Vec::new();
        for record in candidates {
            let mut tree = ResultTree::new(self.alias.clone(), Some(record));
            for join in &self.joins {
                tree.expand(join)?;
            }
            for combination in tree.flatten() {
                if !required.iter().all(|alias| combination.get(alias).is_some()) {
                    continue;
                }
                if self.where_clause.validate_bracket(&combination)? {
                    rows.push(combination);
                }
            }
        }

        let rows = self.sort(rows)?;
        let total = rows.len();
        let rows: Resultset = match self.window {
            Some(window) => {
                let (skip, take) = window.bounds();
                rows.into_iter().skip(skip).take(take).collect()
            }
            None => rows.into_iter().collect(),
        };
        debug!(alias = %self.alias, matched = total, returned = rows.len(), "select executed");
        Ok(rows)
    }

    fn sort(&self, rows: Vec<RecordCollection>) -> TabulaResult<Vec<RecordCollection>> {
        if self.order_by.is_empty() {
            return Ok(rows);
        }
        let mut keyed = rows
            .into_iter()
            .map(|row| {
                let key = self
                    .order_by
                    .iter()
                    .map(|clause| clause.value(&row))
                    .collect::<TabulaResult<Vec<Value>>>()?;
                Ok((key, row))
            })
            .collect::<TabulaResult<Vec<_>>>()?;
        keyed.sort_by(|(a, _), (b, _)| order_by::compare(&self.order_by, a, b));
        Ok(keyed.into_iter().map(|(_, row)| row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, ConditionOperator};
    use crate::element::ConditionElement;
    use tabula_common::{ErrorCode, StoreConfig};
    use tabula_core::{Column, Row};

    fn registry() -> TableRegistry {
        TableRegistry::new(StoreConfig::for_testing(&std::env::temp_dir())).unwrap()
    }

    fn products(registry: &TableRegistry) -> Arc<Table> {
        let table = registry.create_table("product", 100).unwrap();
        table.add_column(Column::string("name", 32)).unwrap();
        table.add_column(Column::int("price", 4)).unwrap();
        table.create().unwrap();
        for (i, (name, price)) in [("tea", 4), ("coffee", 9), ("cake", 6), ("soup", 12)]
            .into_iter()
            .enumerate()
        {
            table
                .set(Some(&i.to_string()), Row::new().with("name", name).with("price", price))
                .unwrap();
        }
        table
    }

    fn keys(result: &Resultset, alias: &str) -> Vec<String> {
        result
            .records(alias)
            .into_iter()
            .map(|record| record.key().to_string())
            .collect()
    }

    fn price_above(selector: &mut TableSelector, value: i64) {
        selector
            .where_mut()
            .first_condition(
                Condition::new(
                    ConditionElement::var("price", "p").unwrap(),
                    ConditionOperator::Superior,
                    Some(ConditionElement::constant(value)),
                )
                .unwrap(),
            )
            .unwrap();
    }

    #[test]
    fn test_scan_and_filter() {
        let registry = registry();
        products(&registry);
        let mut selector = TableSelector::new(&registry, "product", Some("p")).unwrap();
        price_above(&mut selector, 5);
        assert_eq!(keys(&selector.execute().unwrap(), "p"), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_index_and_scan_agree() {
        let registry = registry();
        let table = products(&registry);
        let mut selector = TableSelector::new(&registry, "product", Some("p")).unwrap();
        price_above(&mut selector, 5);
        let scanned = keys(&selector.execute().unwrap(), "p");

        table.add_index(&["price"]).unwrap();
        let indexed = keys(&selector.execute().unwrap(), "p");
        assert_eq!(scanned, indexed);
    }

    #[test]
    fn test_order_and_window() {
        let registry = registry();
        products(&registry);
        let mut selector = TableSelector::new(&registry, "product", Some("p")).unwrap();
        selector
            .add_order_by("price", "p", OrderDirection::Descending)
            .unwrap();
        assert_eq!(keys(&selector.execute().unwrap(), "p"), vec!["3", "1", "2", "0"]);

        selector.limit(1, 2);
        assert_eq!(keys(&selector.execute().unwrap(), "p"), vec!["1", "2"]);

        selector.paginate(2, 3).unwrap();
        assert_eq!(keys(&selector.execute().unwrap(), "p"), vec!["0"]);
    }

    #[test]
    fn test_declaration_errors() {
        let registry = registry();
        products(&registry);
        let mut selector = TableSelector::new(&registry, "product", Some("p")).unwrap();

        let err = selector.add_order_by("weight", "p", OrderDirection::Ascending).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SyntaxError);
        let err = selector.add_order_by("name", "x", OrderDirection::Ascending).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SyntaxError);
        assert!(selector.add_order_by("_key", "p", OrderDirection::Ascending).is_ok());

        let err = selector.join("x", "owner", None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SyntaxError);
        let err = selector.join("p", "p", Some("p")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SyntaxError);
        let err = selector.join("p", "owner", None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ForeignKeyNotFound);

        let err = selector.paginate(0, 10).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SyntaxError);

        let err = TableSelector::new(&registry, "missing", None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TableNotFound);
    }
}
