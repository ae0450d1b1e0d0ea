//! Records and result sets.
//!
//! A `Record` is a detached copy of one row together with the table it was
//! read from and its key. Changes to a record only reach the table when it
//! is persisted.

use std::fmt;
use std::ops::Index;

use tabula_common::{TabulaError, TabulaResult, Value, KEY_COLUMN_NAME};
use tracing::debug;

use crate::registry::TableRegistry;
use crate::row::Row;

/// A row read from a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    table: String,
    key: String,
    data: Row,
}

impl Record {
    /// Creates a record.
    pub fn new(table: impl Into<String>, key: impl Into<String>, data: Row) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
            data,
        }
    }

    /// Returns the name of the table this record belongs to.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Returns the row key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the row data.
    pub fn data(&self) -> &Row {
        &self.data
    }

    /// Consumes the record and returns its data.
    pub fn into_data(self) -> Row {
        self.data
    }

    /// Returns the value of `field`; `_key` returns the row key.
    pub fn value(&self, field: &str) -> TabulaResult<Value> {
        if field == KEY_COLUMN_NAME {
            return Ok(Value::Str(self.key.clone()));
        }
        self.data
            .get(field)
            .cloned()
            .ok_or_else(|| TabulaError::ColumnNotFound {
                column: field.to_string(),
                table: self.table.clone(),
            })
    }

    /// Changes the value of an existing field.
    pub fn set_value(&mut self, field: &str, value: impl Into<Value>) -> TabulaResult<&mut Self> {
        if !self.data.contains(field) {
            return Err(TabulaError::ColumnNotFound {
                column: field.to_string(),
                table: self.table.clone(),
            });
        }
        self.data.insert(field, value);
        Ok(self)
    }

    /// Copies this record under a new key. The copy is not persisted.
    #[must_use]
    pub fn duplicate(&self, key: impl Into<String>) -> Self {
        Self {
            table: self.table.clone(),
            key: key.into(),
            data: self.data.clone(),
        }
    }

    /// Writes this record back to its table.
    pub fn persist(&self, registry: &TableRegistry) -> TabulaResult<()> {
        let table = registry.get_table(&self.table)?;
        table.set(Some(&self.key), self.data.clone())?;
        debug!(table = %self.table, key = %self.key, "record persisted");
        Ok(())
    }

    /// Deletes this record from its table.
    pub fn delete(&self, registry: &TableRegistry) -> TabulaResult<()> {
        let table = registry.get_table(&self.table)?;
        if !table.del(&self.key)? {
            return Err(TabulaError::RecordNotFound {
                table: self.table.clone(),
                key: self.key.clone(),
            });
        }
        debug!(table = %self.table, key = %self.key, "record deleted");
        Ok(())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] {}", self.table, self.key, self.data)
    }
}

/// One combination of joined records, keyed by alias.
///
/// An alias mapped to `None` was produced by a left join that found no
/// partner row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCollection {
    entries: Vec<(String, Option<Record>)>,
}

impl RecordCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection holding one record.
    pub fn single(alias: impl Into<String>, record: Record) -> Self {
        let mut collection = Self::new();
        collection.insert(alias, Some(record));
        collection
    }

    /// Binds `alias`, replacing any previous binding.
    pub fn insert(&mut self, alias: impl Into<String>, record: Option<Record>) {
        let alias = alias.into();
        match self.entries.iter_mut().find(|(a, _)| *a == alias) {
            Some((_, slot)) => *slot = record,
            None => self.entries.push((alias, record)),
        }
    }

    /// Returns true if `alias` is bound, even to an absent record.
    pub fn contains_alias(&self, alias: &str) -> bool {
        self.entries.iter().any(|(a, _)| a == alias)
    }

    /// Returns the record bound to `alias`, if present.
    pub fn get(&self, alias: &str) -> Option<&Record> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .and_then(|(_, record)| record.as_ref())
    }

    /// Returns the record bound to `alias`.
    ///
    /// Fails with `AliasNotFound` when the alias is unbound or absent.
    pub fn record(&self, alias: &str) -> TabulaResult<&Record> {
        self.get(alias).ok_or_else(|| TabulaError::AliasNotFound {
            alias: alias.to_string(),
        })
    }

    /// Returns the bound aliases.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(alias, _)| alias.as_str())
    }

    /// Iterates over the bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Record>)> {
        self.entries
            .iter()
            .map(|(alias, record)| (alias.as_str(), record.as_ref()))
    }

    /// Returns the number of bound aliases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An ordered list of record collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resultset {
    rows: Vec<RecordCollection>,
}

impl Resultset {
    /// Creates an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a collection.
    pub fn push(&mut self, collection: RecordCollection) {
        self.rows.push(collection);
    }

    /// Returns the number of collections.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the collection at `index`.
    pub fn get(&self, index: usize) -> Option<&RecordCollection> {
        self.rows.get(index)
    }

    /// Iterates over the collections.
    pub fn iter(&self) -> std::slice::Iter<'_, RecordCollection> {
        self.rows.iter()
    }

    /// Returns the records bound to `alias`, skipping absent ones.
    pub fn records(&self, alias: &str) -> Vec<&Record> {
        self.rows.iter().filter_map(|row| row.get(alias)).collect()
    }

    /// Consumes the result set and returns its collections.
    pub fn into_vec(self) -> Vec<RecordCollection> {
        self.rows
    }
}

impl Index<usize> for Resultset {
    type Output = RecordCollection;

    fn index(&self, index: usize) -> &Self::Output {
        &self.rows[index]
    }
}

impl FromIterator<RecordCollection> for Resultset {
    fn from_iter<I: IntoIterator<Item = RecordCollection>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<RecordCollection>> for Resultset {
    fn from(rows: Vec<RecordCollection>) -> Self {
        Self { rows }
    }
}

impl IntoIterator for Resultset {
    type Item = RecordCollection;
    type IntoIter = std::vec::IntoIter<RecordCollection>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Resultset {
    type Item = &'a RecordCollection;
    type IntoIter = std::slice::Iter<'a, RecordCollection>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
