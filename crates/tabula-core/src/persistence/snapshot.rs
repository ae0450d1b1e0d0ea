//! Serializable table snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tabula_common::{TabulaError, TabulaResult, Value, KEY_COLUMN_NAME};

use crate::column::{Column, ColumnType};
use crate::row::Row;
use crate::table::Table;

/// Schema entry of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    /// Column name.
    pub name: String,
    /// Column type, written as its numeric code.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Column size in bytes.
    pub size: usize,
}

/// A table's schema, capacity and rows.
///
/// Each row is an object of column values plus its key under `_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Table name.
    pub name: String,
    /// Column definitions, in declaration order.
    pub columns: Vec<ColumnSnapshot>,
    /// Row capacity.
    #[serde(rename = "rowMaxSize")]
    pub row_max_size: usize,
    /// Rows, in iteration order.
    #[serde(default)]
    pub data: Vec<BTreeMap<String, Value>>,
}

impl TableSnapshot {
    /// Captures the schema and rows of `table` under `name`.
    pub fn capture(name: &str, table: &Table) -> TabulaResult<Self> {
        let columns = table
            .columns()
            .iter()
            .map(|column| ColumnSnapshot {
                name: column.name().to_string(),
                column_type: column.column_type(),
                size: column.declared_size().unwrap_or_else(|| column.size()),
            })
            .collect();

        let mut data = Vec::with_capacity(table.len());
        for record in table.records()? {
            let mut line: BTreeMap<String, Value> = record
                .data()
                .iter()
                .map(|(field, value)| (field.to_string(), value.clone()))
                .collect();
            line.insert(KEY_COLUMN_NAME.to_string(), Value::Str(record.key().to_string()));
            data.push(line);
        }

        Ok(Self {
            name: name.to_string(),
            columns,
            row_max_size: table.max_rows(),
            data,
        })
    }

    /// Rebuilds a created table named `name` holding the snapshot rows.
    pub fn restore(self, name: &str) -> TabulaResult<Table> {
        let table = Table::new(name, self.row_max_size);
        for column in self.columns {
            table.add_column(Column::new(column.name, column.column_type, Some(column.size)))?;
        }
        table.create()?;

        for (i, mut line) in self.data.into_iter().enumerate() {
            let key = line
                .remove(KEY_COLUMN_NAME)
                .and_then(|key| key.to_string_value())
                .ok_or_else(|| {
                    TabulaError::serialization(format!("row #{i} of table '{name}' has no key"))
                })?;
            table.set(Some(&key), line.into_iter().collect::<Row>())?;
        }
        Ok(table)
    }
}
