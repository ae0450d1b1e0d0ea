//! Table implementation.
//!
//! A table is a fixed-capacity, key-addressed row store with a typed
//! schema. The schema is frozen by `create`, which allocates the storage.
//! Every write keeps the table's indexes and foreign keys in step with the
//! row store.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tabula_common::{
    StoreConfig, TabulaError, TabulaResult, Value, DEFAULT_INDEX_DATA_SIZE, INDEX_TABLE_PREFIX,
    KEY_COLUMN_NAME,
};
use tracing::{debug, trace, warn};

use crate::cell::{self, Cell};
use crate::column::Column;
use crate::filter::IndexFilter;
use crate::foreign_key::{ForeignKey, ForeignKeyDef};
use crate::id_gen::IdGenerator;
use crate::index::Index;
use crate::record::{Record, Resultset};
use crate::registry::{DestroyToken, TableResolver};
use crate::row::Row;
use crate::row_store::RowStore;

/// A fixed-schema table.
///
/// # Example
///
/// ```rust
/// use tabula_core::{Column, Row, Table, Value};
///
/// let table = Table::new("user", 100);
/// table.add_column(Column::string("name", 64)).unwrap();
/// table.add_column(Column::float("price")).unwrap();
/// table.create().unwrap();
///
/// table.set(Some("1"), Row::new().with("name", "john")).unwrap();
/// let row = table.get("1").unwrap().unwrap();
/// assert_eq!(row.get("name"), Some(&Value::from("john")));
/// assert_eq!(row.get("price"), Some(&Value::Null));
/// ```
#[derive(Debug)]
pub struct Table {
    /// Table name.
    name: String,
    /// Row capacity.
    max_rows: usize,
    /// Column definitions, in declaration order.
    columns: RwLock<Vec<Column>>,
    /// Row storage, allocated by `create`.
    store: RwLock<Option<RowStore>>,
    /// Secondary indexes, keyed by their field list.
    indexes: RwLock<BTreeMap<String, Arc<Index>>>,
    /// Foreign keys declared on or reflected onto this table.
    foreign_keys: RwLock<BTreeMap<String, Arc<ForeignKey>>>,
    /// Key generator used when `set` receives no key.
    id_generator: RwLock<Option<Arc<dyn IdGenerator>>>,
    /// Handle on the owning registry.
    resolver: RwLock<Option<TableResolver>>,
}

impl Table {
    /// Creates a table with no columns and no storage.
    pub fn new(name: impl Into<String>, max_rows: usize) -> Self {
        Self {
            name: name.into(),
            max_rows,
            columns: RwLock::new(Vec::new()),
            store: RwLock::new(None),
            indexes: RwLock::new(BTreeMap::new()),
            foreign_keys: RwLock::new(BTreeMap::new()),
            id_generator: RwLock::new(None),
            resolver: RwLock::new(None),
        }
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the row capacity.
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Returns true once `create` has allocated storage.
    pub fn is_created(&self) -> bool {
        self.store.read().is_some()
    }

    // =========================================================================
    // Schema
    // =========================================================================

    /// Declares a column.
    ///
    /// Fails with `MalformedSchema` when the definition is invalid, the
    /// name is taken or the table was already created.
    pub fn add_column(&self, column: Column) -> TabulaResult<&Self> {
        column.validate(&self.name)?;
        if self.is_created() {
            return Err(TabulaError::malformed_schema(
                &self.name,
                "columns cannot be added once the table is created",
            ));
        }

        let mut columns = self.columns.write();
        if columns.iter().any(|c| c.name() == column.name()) {
            return Err(TabulaError::malformed_schema(
                &self.name,
                format!("column '{}' declared twice", column.name()),
            ));
        }
        columns.push(column);
        Ok(self)
    }

    /// Returns the column definitions.
    pub fn columns(&self) -> Vec<Column> {
        self.columns.read().clone()
    }

    /// Returns a column definition by name.
    pub fn column(&self, name: &str) -> TabulaResult<Column> {
        self.columns
            .read()
            .iter()
            .find(|c| c.name() == name)
            .cloned()
            .ok_or_else(|| self.column_not_found(name))
    }

    /// Returns true if `name` is a column or the key pseudo-column.
    pub fn has_field(&self, name: &str) -> bool {
        name == KEY_COLUMN_NAME || self.columns.read().iter().any(|c| c.name() == name)
    }

    /// Allocates the row storage and freezes the schema.
    ///
    /// Calling `create` on a created table does nothing.
    pub fn create(&self) -> TabulaResult<()> {
        let columns = self.columns.read().len();
        let mut store = self.store.write();
        if store.is_some() {
            return Ok(());
        }
        *store = Some(RowStore::new(self.name.clone(), self.max_rows));
        debug!(
            table = %self.name,
            columns,
            max_rows = self.max_rows,
            "table created"
        );
        Ok(())
    }

    /// Sets the generator used for rows inserted without a key.
    pub fn set_id_generator(&self, generator: Arc<dyn IdGenerator>) {
        *self.id_generator.write() = Some(generator);
    }

    /// Binds the table to a registry.
    pub(crate) fn bind(&self, resolver: TableResolver) {
        *self.resolver.write() = Some(resolver);
    }

    /// Returns the registry handle, if the table is bound to one.
    pub fn resolver(&self) -> Option<TableResolver> {
        self.resolver.read().clone()
    }

    // =========================================================================
    // Row Operations
    // =========================================================================

    /// Inserts or updates a row and returns its key.
    ///
    /// Without a key one is drawn from the id generator. On an existing key
    /// the supplied fields are merged into the stored row; on a new key the
    /// fields left out are null.
    pub fn set(&self, key: Option<&str>, values: Row) -> TabulaResult<String> {
        if !self.is_created() {
            return Err(self.not_created());
        }
        let key = match key {
            Some(key) => key.to_string(),
            None => self.generate_key()?,
        };

        let (old_row, new_row) = {
            let columns = self.columns.read();
            let mut supplied = Vec::with_capacity(values.len());
            for (name, value) in values.iter() {
                let position = columns
                    .iter()
                    .position(|c| c.name() == name)
                    .ok_or_else(|| self.column_not_found(name))?;
                supplied.push((position, cell::encode(&columns[position], value)?));
            }

            let mut guard = self.store.write();
            let store = guard.as_mut().ok_or_else(|| self.not_created())?;
            let mut cells = match store.get(&key) {
                Some(cells) => cells.to_vec(),
                None => columns
                    .iter()
                    .map(cell::null_cell)
                    .collect::<TabulaResult<Vec<_>>>()?,
            };
            for (position, cell) in supplied {
                cells[position] = cell;
            }

            let new_row = decode_row(&columns, &cells)?;
            let old_row = store
                .upsert(&key, cells)?
                .map(|previous| decode_row(&columns, &previous))
                .transpose()?;
            (old_row, new_row)
        };

        self.reindex(&key, old_row.as_ref(), Some(&new_row))?;
        for foreign_key in self.foreign_key_list() {
            foreign_key.on_row_set(&key, old_row.as_ref(), &new_row)?;
        }

        trace!(table = %self.name, key = %key, update = old_row.is_some(), "row set");
        Ok(key)
    }

    /// Returns a row, or `None` when the key is unknown.
    pub fn get(&self, key: &str) -> TabulaResult<Option<Row>> {
        let columns = self.columns.read();
        let guard = self.store.read();
        let store = guard.as_ref().ok_or_else(|| self.not_created())?;
        match store.get(key) {
            Some(cells) => decode_row(&columns, cells).map(Some),
            None => Ok(None),
        }
    }

    /// Returns one field of a row; `_key` returns the key itself.
    pub fn get_value(&self, key: &str, field: &str) -> TabulaResult<Value> {
        if field != KEY_COLUMN_NAME && !self.has_field(field) {
            return Err(self.column_not_found(field));
        }
        let row = self.get(key)?.ok_or_else(|| self.record_not_found(key))?;
        if field == KEY_COLUMN_NAME {
            return Ok(Value::Str(key.to_string()));
        }
        Ok(row.get(field).cloned().unwrap_or(Value::Null))
    }

    /// Returns a row as a record.
    pub fn get_record(&self, key: &str) -> TabulaResult<Record> {
        let row = self.get(key)?.ok_or_else(|| self.record_not_found(key))?;
        Ok(Record::new(self.name.clone(), key, row))
    }

    /// Returns true if the key is present. False on an uncreated table.
    pub fn exists(&self, key: &str) -> bool {
        self.store
            .read()
            .as_ref()
            .is_some_and(|store| store.contains(key))
    }

    /// Deletes a row. Returns false when the key is unknown.
    pub fn del(&self, key: &str) -> TabulaResult<bool> {
        let Some(row) = self.get(key)? else {
            return Ok(false);
        };

        for foreign_key in self.foreign_key_list() {
            foreign_key.on_row_deleted(key, &row)?;
        }
        self.reindex(key, Some(&row), None)?;

        let removed = self
            .store
            .write()
            .as_mut()
            .ok_or_else(|| self.not_created())?
            .remove(key)
            .is_some();
        trace!(table = %self.name, key, "row deleted");
        Ok(removed)
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.store.read().as_ref().map_or(0, RowStore::len)
    }

    /// Returns true if the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every key, in iteration order.
    pub fn keys(&self) -> Vec<String> {
        self.store
            .read()
            .as_ref()
            .map(|store| store.iter().map(|row| row.key.clone()).collect())
            .unwrap_or_default()
    }

    /// Returns a snapshot of every row, in iteration order.
    pub fn records(&self) -> TabulaResult<Vec<Record>> {
        let columns = self.columns.read();
        let guard = self.store.read();
        let store = guard.as_ref().ok_or_else(|| self.not_created())?;
        store
            .iter()
            .map(|row| {
                decode_row(&columns, &row.cells)
                    .map(|data| Record::new(self.name.clone(), row.key.clone(), data))
            })
            .collect()
    }

    /// Returns a cursor positioned on the first row.
    pub fn cursor(&self) -> Cursor<'_> {
        let mut cursor = Cursor {
            table: self,
            slot: None,
        };
        cursor.rewind();
        cursor
    }

    // =========================================================================
    // Indexes
    // =========================================================================

    /// Adds an index over `fields` with the registry's default capacities.
    pub fn add_index(&self, fields: &[&str]) -> TabulaResult<&Self> {
        let config = self.config();
        self.add_index_with_capacity(fields, config.index_node_capacity, DEFAULT_INDEX_DATA_SIZE)
    }

    /// Adds an index over `fields`.
    ///
    /// `max_nodes` bounds the number of distinct tuples and `data_size` the
    /// serialized size of one tuple. Existing rows are indexed immediately.
    /// Adding an index that already exists does nothing.
    pub fn add_index_with_capacity(
        &self,
        fields: &[&str],
        max_nodes: usize,
        data_size: usize,
    ) -> TabulaResult<&Self> {
        if fields.is_empty() {
            return Err(TabulaError::index(format!(
                "index on table '{}' needs at least one field",
                self.name
            )));
        }
        for field in fields {
            if !self.columns.read().iter().any(|c| c.name() == *field) {
                return Err(TabulaError::index(format!(
                    "field '{field}' does not exist in table '{}'",
                    self.name
                )));
            }
        }

        let id = index_id(fields);
        if self.indexes.read().contains_key(&id) {
            return Ok(self);
        }

        let index = Index::new(
            format!("{INDEX_TABLE_PREFIX}{}_{id}", self.name),
            fields.iter().map(|f| (*f).to_string()).collect(),
            max_nodes,
            data_size,
            self.config().index_keys_blob_size,
        )?;

        if self.is_created() {
            for record in self.records()? {
                index.insert(record.key(), &record.data().project(index.fields()))?;
            }
        }

        debug!(table = %self.name, index = %index.name(), rows = self.len(), "index added");
        self.indexes.write().insert(id, Arc::new(index));
        Ok(self)
    }

    /// Returns the index over exactly `fields`, in that order.
    pub fn index(&self, fields: &[&str]) -> Option<Arc<Index>> {
        self.indexes.read().get(&index_id(fields)).cloned()
    }

    /// Returns every index of the table.
    pub fn indexes(&self) -> Vec<Arc<Index>> {
        self.indexes.read().values().cloned().collect()
    }

    /// Returns true if some index covers `field`, at any position.
    pub fn has_index_on(&self, field: &str) -> bool {
        self.indexes
            .read()
            .values()
            .any(|index| index.fields().iter().any(|f| f == field))
    }

    /// Returns true if `filters` can be answered by at least one index.
    pub fn can_filter_with_index(&self, filters: &[IndexFilter]) -> bool {
        self.indexes
            .read()
            .values()
            .any(|index| !index.plan(filters).is_empty())
    }

    /// Returns the records matching every filter an index can answer.
    ///
    /// Each index contributes the probes it can plan; the key sets of all
    /// probes are intersected. Filters no index covers are ignored, so the
    /// result is a superset of the exact answer. When no index applies the
    /// result is empty; check `can_filter_with_index` first.
    pub fn filter_with_index(&self, filters: &[IndexFilter]) -> TabulaResult<Vec<Record>> {
        let mut candidates: Option<Vec<String>> = None;
        for index in self.indexes() {
            for (operator, probe) in index.plan(filters) {
                let keys = index.get_keys(operator, &probe)?;
                candidates = Some(match candidates {
                    None => keys,
                    Some(current) => {
                        let matched: HashSet<&String> = keys.iter().collect();
                        current.into_iter().filter(|k| matched.contains(k)).collect()
                    }
                });
            }
        }
        let Some(keys) = candidates else {
            return Ok(Vec::new());
        };

        let columns = self.columns.read();
        let guard = self.store.read();
        let store = guard.as_ref().ok_or_else(|| self.not_created())?;
        let mut positioned: Vec<(usize, String)> = keys
            .into_iter()
            .filter_map(|key| store.position(&key).map(|slot| (slot, key)))
            .collect();
        positioned.sort_unstable_by_key(|(slot, _)| *slot);

        positioned
            .into_iter()
            .filter_map(|(_, key)| store.get(&key).map(|cells| (key, cells)))
            .map(|(key, cells)| {
                decode_row(&columns, cells).map(|data| Record::new(self.name.clone(), key, data))
            })
            .collect()
    }

    fn reindex(&self, key: &str, old: Option<&Row>, new: Option<&Row>) -> TabulaResult<()> {
        for index in self.indexes() {
            let old_tuple = old.map(|row| row.project(index.fields()));
            let new_tuple = new.map(|row| row.project(index.fields()));
            if old_tuple == new_tuple {
                continue;
            }
            if let Some(tuple) = old_tuple {
                index.remove(key, &tuple)?;
            }
            if let Some(tuple) = new_tuple {
                index.insert(key, &tuple)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Foreign Keys
    // =========================================================================

    /// Declares a foreign key from `from_field` to the key of `to_table`.
    pub fn add_foreign_key(&self, name: &str, to_table: &str, from_field: &str) -> TabulaResult<&Self> {
        self.add_foreign_key_def(ForeignKeyDef::new(name, to_table, from_field))
    }

    /// Declares a foreign key and its reflection on the target table.
    ///
    /// When the target field is not the key, an index is added on it. Rows
    /// already present on either side are linked.
    pub fn add_foreign_key_def(&self, def: ForeignKeyDef) -> TabulaResult<&Self> {
        let resolver = self.resolver().ok_or_else(|| {
            TabulaError::configuration(format!(
                "table '{}' is not registered; foreign keys need a registry",
                self.name
            ))
        })?;
        let registry = resolver.registry()?;
        let target = registry.get_table(def.to_table())?;

        if !self.has_field(def.from_field()) {
            return Err(self.column_not_found(def.from_field()));
        }
        if !target.has_field(def.to_field()) {
            return Err(target.column_not_found(def.to_field()));
        }
        if self.foreign_keys.read().contains_key(def.name()) {
            return Err(TabulaError::malformed_schema(
                &self.name,
                format!("foreign key '{}' declared twice", def.name()),
            ));
        }
        let reflected = def.reflected_name_for(&self.name);
        let self_reflected = def.to_table() == self.name && reflected == def.name();
        if self_reflected || target.foreign_keys.read().contains_key(&reflected) {
            return Err(TabulaError::malformed_schema(
                def.to_table(),
                format!("foreign key '{reflected}' already declared"),
            ));
        }
        if def.to_field() != KEY_COLUMN_NAME {
            target.add_index(&[def.to_field()])?;
        }

        let (from, to) = ForeignKey::pair(&registry, &self.name, &def)?;
        let from = Arc::new(from);
        let to = Arc::new(to);
        self.foreign_keys
            .write()
            .insert(from.name().to_string(), Arc::clone(&from));
        target
            .foreign_keys
            .write()
            .insert(to.name().to_string(), Arc::clone(&to));

        if self.is_created() {
            for record in self.records()? {
                from.on_row_set(record.key(), None, record.data())?;
            }
        }
        if target.is_created() && def.to_field() != KEY_COLUMN_NAME {
            for record in target.records()? {
                to.on_row_set(record.key(), None, record.data())?;
            }
        }

        debug!(
            table = %self.name,
            foreign_key = %from.name(),
            reflected = %to.name(),
            to_table = %def.to_table(),
            "foreign key added"
        );
        Ok(self)
    }

    /// Returns a foreign key by name.
    pub fn foreign_key(&self, name: &str) -> TabulaResult<Arc<ForeignKey>> {
        self.foreign_keys
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| TabulaError::ForeignKeyNotFound {
                table: self.name.clone(),
                name: name.to_string(),
            })
    }

    /// Returns the names of the foreign keys of this table.
    pub fn foreign_key_names(&self) -> Vec<String> {
        self.foreign_keys.read().keys().cloned().collect()
    }

    /// Returns the records linked to `record` through a foreign key.
    ///
    /// Each record is wrapped in a collection under `alias`, or the target
    /// table's name when no alias is given.
    pub fn get_joined_records(
        &self,
        foreign_key: &str,
        record: &Record,
        alias: Option<&str>,
    ) -> TabulaResult<Resultset> {
        self.foreign_key(foreign_key)?
            .get_foreign_records(record, alias)
    }

    fn foreign_key_list(&self) -> Vec<Arc<ForeignKey>> {
        self.foreign_keys.read().values().cloned().collect()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Releases the storage, indexes and foreign keys of the table.
    ///
    /// Only the registry can mint the token, so destroy always goes through
    /// `TableRegistry::destroy`.
    pub fn destroy(&self, _token: DestroyToken) -> Vec<String> {
        *self.store.write() = None;
        self.indexes.write().clear();
        let foreign_keys = std::mem::take(&mut *self.foreign_keys.write());
        debug!(table = %self.name, "table destroyed");
        foreign_keys
            .values()
            .map(|fk| fk.adjacency_table_name().to_string())
            .collect()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn generate_key(&self) -> TabulaResult<String> {
        let generator = self.id_generator.read().clone().ok_or_else(|| {
            TabulaError::configuration(format!(
                "table '{}' has no id generator and no key was given",
                self.name
            ))
        })?;

        let attempts = self.config().max_key_generation_attempts;
        for _ in 0..attempts {
            let key = generator.generate()?;
            if !self.exists(&key) {
                return Ok(key);
            }
            warn!(table = %self.name, key = %key, "generated key collides, retrying");
        }
        Err(TabulaError::configuration(format!(
            "no free key for table '{}' after {attempts} attempts",
            self.name
        )))
    }

    fn config(&self) -> StoreConfig {
        self.resolver()
            .and_then(|resolver| resolver.registry().ok())
            .map(|registry| registry.config().clone())
            .unwrap_or_default()
    }

    fn not_created(&self) -> TabulaError {
        TabulaError::TableNotCreated {
            table: self.name.clone(),
        }
    }

    fn column_not_found(&self, column: &str) -> TabulaError {
        TabulaError::ColumnNotFound {
            column: column.to_string(),
            table: self.name.clone(),
        }
    }

    fn record_not_found(&self, key: &str) -> TabulaError {
        TabulaError::RecordNotFound {
            table: self.name.clone(),
            key: key.to_string(),
        }
    }
}

/// Iterates over the rows of a table in slot order.
///
/// The cursor reads the live table, so rows written during iteration may or
/// may not be visited.
pub struct Cursor<'a> {
    table: &'a Table,
    slot: Option<usize>,
}

impl<'a> Cursor<'a> {
    /// Moves back to the first row.
    pub fn rewind(&mut self) {
        self.slot = self.seek(0);
    }

    /// Returns true if the cursor is on a row.
    pub fn valid(&self) -> bool {
        self.current_key().is_some()
    }

    /// Returns the key of the current row.
    pub fn current_key(&self) -> Option<String> {
        let slot = self.slot?;
        let guard = self.table.store.read();
        guard.as_ref()?.at(slot).map(|row| row.key.clone())
    }

    /// Returns the current row as a record.
    pub fn current(&self) -> TabulaResult<Option<Record>> {
        match self.current_key() {
            Some(key) => self.table.get_record(&key).map(Some),
            None => Ok(None),
        }
    }

    /// Moves to the next row.
    pub fn advance(&mut self) {
        if let Some(slot) = self.slot {
            self.slot = self.seek(slot + 1);
        }
    }

    fn seek(&self, from: usize) -> Option<usize> {
        self.table.store.read().as_ref()?.next_occupied(from)
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = TabulaResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.slot?;
            let current = self.current();
            self.advance();
            match current {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn decode_row(columns: &[Column], cells: &[Cell]) -> TabulaResult<Row> {
    let mut row = Row::new();
    for (column, cell) in columns.iter().zip(cells) {
        row.insert(column.name(), cell::decode_nullable(column, cell)?);
    }
    Ok(row)
}

fn index_id(fields: &[&str]) -> String {
    fields.join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Operator;
    use tabula_common::ErrorCode;

    fn user_table(max_rows: usize) -> Table {
        let table = Table::new("user", max_rows);
        table
            .add_column(Column::string("name", 64))
            .unwrap()
            .add_column(Column::float("price"))
            .unwrap()
            .add_column(Column::int("age", 2))
            .unwrap();
        table.create().unwrap();
        table
    }

    #[test]
    fn test_not_created() {
        let table = Table::new("t", 10);
        table.add_column(Column::int("a", 4)).unwrap();
        let err = table.set(Some("k"), Row::new().with("a", 1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TableNotCreated);
        assert!(!table.exists("k"));
        assert!(table.get("k").is_err());
    }

    #[test]
    fn test_schema_frozen_after_create() {
        let table = user_table(10);
        let err = table.add_column(Column::int("x", 4)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedSchema);
        assert!(table.create().is_ok());
    }

    #[test]
    fn test_duplicate_column() {
        let table = Table::new("t", 10);
        table.add_column(Column::int("a", 4)).unwrap();
        assert!(table.add_column(Column::string("a", 4)).is_err());
    }

    #[test]
    fn test_set_merges_and_nulls() {
        let table = user_table(10);
        table
            .set(Some("1"), Row::new().with("name", "john").with("price", 12.5))
            .unwrap();
        table.set(Some("1"), Row::new().with("age", 40)).unwrap();

        let row = table.get("1").unwrap().unwrap();
        assert_eq!(row.get("name"), Some(&Value::from("john")));
        assert_eq!(row.get("price"), Some(&Value::Float(12.5)));
        assert_eq!(row.get("age"), Some(&Value::Int(40)));

        table.set(Some("2"), Row::new().with("name", "paul")).unwrap();
        assert_eq!(table.get_value("2", "price").unwrap(), Value::Null);
        assert_eq!(table.get_value("2", "_key").unwrap(), Value::from("2"));
    }

    #[test]
    fn test_set_errors() {
        let table = user_table(10);
        let err = table.set(Some("1"), Row::new().with("city", "x")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ColumnNotFound);
        let err = table.set(Some("1"), Row::new().with("age", 1 << 20)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValueTooLarge);
        assert!(!table.exists("1"));
    }

    #[test]
    fn test_narrow_columns_accept_rows() {
        let table = Table::new("flags", 10);
        table
            .add_column(Column::string("c", 1))
            .unwrap()
            .add_column(Column::int("n", 1))
            .unwrap();
        table.create().unwrap();

        table.set(Some("k"), Row::new().with("c", "y")).unwrap();
        assert_eq!(table.get_value("k", "c").unwrap(), Value::from("y"));
        assert_eq!(table.get_value("k", "n").unwrap(), Value::Null);
        table.set(Some("j"), Row::new().with("n", 7)).unwrap();
        assert_eq!(table.get_value("j", "c").unwrap(), Value::Null);
    }

    #[test]
    fn test_mistyped_null_value_rejected() {
        let table = Table::new("t", 10);
        let err = table
            .add_column(Column::int("a", 4).with_null_value("none"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedSchema);
    }

    #[test]
    fn test_capacity() {
        let table = user_table(2);
        table.set(Some("1"), Row::new()).unwrap();
        table.set(Some("2"), Row::new()).unwrap();
        let err = table.set(Some("3"), Row::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TableFull);
        assert!(table.del("1").unwrap());
        table.set(Some("3"), Row::new()).unwrap();
    }

    #[test]
    fn test_get_missing() {
        let table = user_table(10);
        assert!(table.get("nope").unwrap().is_none());
        let err = table.get_record("nope").unwrap_err();
        assert_eq!(err.code(), ErrorCode::RecordNotFound);
        let err = table.get_value("nope", "city").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ColumnNotFound);
        assert!(!table.del("nope").unwrap());
    }

    #[test]
    fn test_missing_generator() {
        let table = user_table(10);
        let err = table.set(None, Row::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Configuration);
    }

    #[test]
    fn test_cursor() {
        let table = user_table(10);
        for key in ["a", "b", "c"] {
            table.set(Some(key), Row::new().with("name", key)).unwrap();
        }
        table.del("b").unwrap();

        let mut cursor = table.cursor();
        assert!(cursor.valid());
        assert_eq!(cursor.current_key().as_deref(), Some("a"));
        cursor.advance();
        assert_eq!(cursor.current_key().as_deref(), Some("c"));
        cursor.advance();
        assert!(!cursor.valid());
        cursor.rewind();
        assert!(cursor.valid());

        let keys: Vec<String> = table
            .cursor()
            .map(|r| r.unwrap().key().to_string())
            .collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_index_backfill_and_maintenance() {
        let table = user_table(100);
        table.set(Some("1"), Row::new().with("name", "john")).unwrap();
        table.set(Some("2"), Row::new().with("name", "paul")).unwrap();
        table.add_index(&["name"]).unwrap();

        let index = table.index(&["name"]).unwrap();
        assert_eq!(index.name(), "_INDEX_user_name");
        assert_eq!(index.search_equal(&[Value::from("john")]).unwrap(), vec!["1"]);

        table.set(Some("1"), Row::new().with("name", "george")).unwrap();
        assert!(index.search_equal(&[Value::from("john")]).unwrap().is_empty());
        assert_eq!(index.search_equal(&[Value::from("george")]).unwrap(), vec!["1"]);

        table.del("2").unwrap();
        assert!(index.search_equal(&[Value::from("paul")]).unwrap().is_empty());
    }

    #[test]
    fn test_add_index_unknown_field() {
        let table = user_table(10);
        let err = table.add_index(&["city"]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Index);
        assert!(table.add_index(&[]).is_err());
    }

    #[test]
    fn test_filter_with_index() {
        let table = user_table(100);
        table.add_index(&["name"]).unwrap();
        table.add_index(&["price"]).unwrap();
        for i in 0..20 {
            let name = if i % 2 == 0 { "john" } else { "paul" };
            table
                .set(
                    Some(&format!("{i:02}")),
                    Row::new().with("name", name).with("price", f64::from(i)),
                )
                .unwrap();
        }

        let filters = vec![
            IndexFilter::new(Operator::Equal, "name", "john"),
            IndexFilter::new(Operator::InferiorOrEqual, "price", 10.0),
        ];
        assert!(table.can_filter_with_index(&filters));
        let keys: Vec<String> = table
            .filter_with_index(&filters)
            .unwrap()
            .iter()
            .map(|r| r.key().to_string())
            .collect();
        assert_eq!(keys, vec!["00", "02", "04", "06", "08", "10"]);

        let unusable = vec![IndexFilter::new(Operator::Equal, "age", 3)];
        assert!(!table.can_filter_with_index(&unusable));
        assert!(table.filter_with_index(&unusable).unwrap().is_empty());
    }

    #[test]
    fn test_foreign_key_requires_registry() {
        let table = user_table(10);
        let err = table.add_foreign_key("owner", "user", "name").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Configuration);
    }
}
