//! Joins along foreign keys.

use std::sync::Arc;

use tabula_common::{TabulaError, TabulaResult};
use tabula_core::{Record, Table};

/// How a join treats a row without partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// Rows without partner are dropped.
    Inner,
    /// Rows without partner are kept with the alias absent.
    Left,
}

/// A join from an aliased table through one of its foreign keys.
#[derive(Debug, Clone)]
pub struct Join {
    from_alias: String,
    from_table: Arc<Table>,
    foreign_key: String,
    alias: String,
    to_table: Arc<Table>,
    join_type: JoinType,
}

impl Join {
    /// Declares a join. The foreign key must exist on `from_table`.
    pub fn new(
        from_alias: impl Into<String>,
        from_table: Arc<Table>,
        foreign_key: impl Into<String>,
        alias: impl Into<String>,
        join_type: JoinType,
    ) -> TabulaResult<Self> {
        let foreign_key = foreign_key.into();
        let to_table = from_table
            .resolver()
            .ok_or_else(|| {
                TabulaError::configuration(format!(
                    "table '{}' is not registered; joins need a registry",
                    from_table.name()
                ))
            })?
            .resolve(from_table.foreign_key(&foreign_key)?.to_table())?;

        Ok(Self {
            from_alias: from_alias.into(),
            from_table,
            foreign_key,
            alias: alias.into(),
            to_table,
            join_type,
        })
    }

    /// Returns the alias joined from.
    pub fn from_alias(&self) -> &str {
        &self.from_alias
    }

    /// Returns the foreign-key name.
    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    /// Returns the alias of the joined table.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns the joined table.
    pub fn to_table(&self) -> &Arc<Table> {
        &self.to_table
    }

    /// Returns the join type.
    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    /// Returns the records linked to `record`.
    pub fn get(&self, record: &Record) -> TabulaResult<Vec<Record>> {
        let linked = self
            .from_table
            .get_joined_records(&self.foreign_key, record, Some(&self.alias))?;
        linked
            .iter()
            .map(|collection| collection.record(&self.alias).cloned())
            .collect()
    }
}
