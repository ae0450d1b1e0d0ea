//! Result ordering.

use std::cmp::Ordering;
use std::fmt;

use tabula_common::{TabulaResult, Value};
use tabula_core::RecordCollection;

/// Sort direction of one ordering clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Ascending => f.write_str("ASC"),
            OrderDirection::Descending => f.write_str("DESC"),
        }
    }
}

/// An `alias.field DIRECTION` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByField {
    alias: String,
    field: String,
    direction: OrderDirection,
}

impl OrderByField {
    /// Creates a clause.
    pub fn new(field: impl Into<String>, alias: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            alias: alias.into(),
            field: field.into(),
            direction,
        }
    }

    /// Creates an ascending clause.
    pub fn asc(field: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(field, alias, OrderDirection::Ascending)
    }

    /// Creates a descending clause.
    pub fn desc(field: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(field, alias, OrderDirection::Descending)
    }

    /// Returns the table alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the direction.
    pub fn direction(&self) -> OrderDirection {
        self.direction
    }

    /// Reads the sort value of a row combination.
    ///
    /// An alias bound to an absent record sorts as null.
    pub fn value(&self, context: &RecordCollection) -> TabulaResult<Value> {
        match context.get(&self.alias) {
            Some(record) => record.value(&self.field),
            None => Ok(Value::Null),
        }
    }
}

impl fmt::Display for OrderByField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}", self.alias, self.field, self.direction)
    }
}

/// Compares two sort keys clause by clause, the first clause first.
pub(crate) fn compare(clauses: &[OrderByField], a: &[Value], b: &[Value]) -> Ordering {
    for ((clause, left), right) in clauses.iter().zip(a).zip(b) {
        let ordering = match clause.direction {
            OrderDirection::Ascending => left.cmp(right),
            OrderDirection::Descending => right.cmp(left),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
