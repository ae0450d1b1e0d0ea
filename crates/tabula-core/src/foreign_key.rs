//! Foreign keys.
//!
//! Declaring a foreign key creates two linked halves: the "from" half on
//! the referencing table and its reflection, the "to" half, on the
//! referenced table. Each half owns an adjacency table mapping a source
//! value to the keys of the rows it links to.
//!
//! Adjacency rows are keyed `"<value>_<i>"` with `i` counting up from 0.
//! Links are soft-deleted by clearing `valid`, so the slots of a value
//! always form a contiguous run and a probe stops at the first free slot.

use std::sync::Arc;

use parking_lot::Mutex;
use tabula_common::{
    TabulaError, TabulaResult, Value, FOREIGN_KEY_TARGET_SIZE, FROM_INDEX_TABLE_PREFIX,
    KEY_COLUMN_NAME, TO_INDEX_TABLE_PREFIX,
};
use tracing::{trace, warn};

use crate::column::Column;
use crate::record::{Record, RecordCollection, Resultset};
use crate::registry::{TableRegistry, TableResolver};
use crate::row::Row;
use crate::table::Table;

const TARGET: &str = "foreignKey";
const VALID: &str = "valid";

/// Which half of a foreign-key pair a `ForeignKey` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignKeyDirection {
    /// Declared on the referencing table.
    From,
    /// Reflected onto the referenced table.
    To,
}

/// Declaration of a foreign key.
///
/// # Example
///
/// ```rust
/// use tabula_core::ForeignKeyDef;
///
/// let def = ForeignKeyDef::new("owner", "user", "ownerId").reflected_as("posts");
/// assert_eq!(def.to_field(), "_key");
/// assert_eq!(def.reflected_name(), Some("posts"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    name: String,
    to_table: String,
    from_field: String,
    to_field: String,
    reflected_name: Option<String>,
}

impl ForeignKeyDef {
    /// Declares `from_field` as referencing the key of `to_table`.
    pub fn new(
        name: impl Into<String>,
        to_table: impl Into<String>,
        from_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            to_table: to_table.into(),
            from_field: from_field.into(),
            to_field: KEY_COLUMN_NAME.to_string(),
            reflected_name: None,
        }
    }

    /// References `to_field` instead of the target key.
    #[must_use]
    pub fn with_to_field(mut self, to_field: impl Into<String>) -> Self {
        self.to_field = to_field.into();
        self
    }

    /// Names the reflected half. Defaults to the referencing table's name
    /// followed by `s`.
    #[must_use]
    pub fn reflected_as(mut self, name: impl Into<String>) -> Self {
        self.reflected_name = Some(name.into());
        self
    }

    /// Returns the foreign key name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the referenced table.
    pub fn to_table(&self) -> &str {
        &self.to_table
    }

    /// Returns the referencing field.
    pub fn from_field(&self) -> &str {
        &self.from_field
    }

    /// Returns the referenced field.
    pub fn to_field(&self) -> &str {
        &self.to_field
    }

    /// Returns the reflected name, when overridden.
    pub fn reflected_name(&self) -> Option<&str> {
        self.reflected_name.as_deref()
    }

    /// Returns the name of the reflected half when declared on `from_table`.
    pub(crate) fn reflected_name_for(&self, from_table: &str) -> String {
        self.reflected_name
            .clone()
            .unwrap_or_else(|| format!("{from_table}s"))
    }
}

/// One half of a foreign-key pair.
#[derive(Debug)]
pub struct ForeignKey {
    /// Name, unique within the owning table.
    name: String,
    /// Table owning this half.
    from_table: String,
    /// Field of the owning table holding the source value.
    from_field: String,
    /// Table the links point into.
    to_table: String,
    /// Field of `to_table` matched against the source value.
    to_field: String,
    direction: ForeignKeyDirection,
    /// Name of the other half, on `to_table`.
    reflected_name: String,
    /// Adjacency table of this half.
    adjacency: Arc<Table>,
    /// Probe cap per source value.
    capacity: usize,
    resolver: TableResolver,
    /// Serializes adjacency writers.
    latch: Mutex<()>,
}

impl ForeignKey {
    /// Builds both halves of a foreign key declared on `from_table`.
    pub(crate) fn pair(
        registry: &TableRegistry,
        from_table: &str,
        def: &ForeignKeyDef,
    ) -> TabulaResult<(Self, Self)> {
        let reflected = def.reflected_name_for(from_table);
        let capacity = registry.config().foreign_index_capacity;

        let from = Self {
            name: def.name.clone(),
            from_table: from_table.to_string(),
            from_field: def.from_field.clone(),
            to_table: def.to_table.clone(),
            to_field: def.to_field.clone(),
            direction: ForeignKeyDirection::From,
            reflected_name: reflected.clone(),
            adjacency: open_adjacency(
                registry,
                &format!("{FROM_INDEX_TABLE_PREFIX}{from_table}_{}", def.name),
                capacity,
            )?,
            capacity,
            resolver: registry.resolver(),
            latch: Mutex::new(()),
        };
        let to = Self {
            adjacency: open_adjacency(
                registry,
                &format!("{TO_INDEX_TABLE_PREFIX}{}_{reflected}", def.to_table),
                capacity,
            )?,
            name: reflected,
            from_table: def.to_table.clone(),
            from_field: def.to_field.clone(),
            to_table: from_table.to_string(),
            to_field: def.from_field.clone(),
            direction: ForeignKeyDirection::To,
            reflected_name: def.name.clone(),
            capacity,
            resolver: registry.resolver(),
            latch: Mutex::new(()),
        };
        Ok((from, to))
    }

    /// Returns the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the table owning this half.
    pub fn from_table(&self) -> &str {
        &self.from_table
    }

    /// Returns the source field on the owning table.
    pub fn from_field(&self) -> &str {
        &self.from_field
    }

    /// Returns the table the links point into.
    pub fn to_table(&self) -> &str {
        &self.to_table
    }

    /// Returns the matched field on `to_table`.
    pub fn to_field(&self) -> &str {
        &self.to_field
    }

    /// Returns which half this is.
    pub fn direction(&self) -> ForeignKeyDirection {
        self.direction
    }

    /// Returns the name of the other half.
    pub fn reflected_name(&self) -> &str {
        &self.reflected_name
    }

    /// Returns the name of the adjacency table.
    pub fn adjacency_table_name(&self) -> &str {
        self.adjacency.name()
    }

    /// Returns the other half of the pair.
    pub fn reflected(&self) -> TabulaResult<Arc<ForeignKey>> {
        self.resolver
            .resolve(&self.to_table)?
            .foreign_key(&self.reflected_name)
    }

    // =========================================================================
    // Adjacency Operations
    // =========================================================================

    /// Links `value` to the row `target` of `to_table`.
    ///
    /// An existing link is kept, and revalidated if it was deleted.
    pub fn add_to_foreign_index(&self, value: &Value, target: &str) -> TabulaResult<()> {
        let _latch = self.latch.lock();

        let mut free = None;
        for i in 0..self.capacity {
            let slot = slot_key(value, i);
            match self.adjacency.get(&slot)? {
                None => {
                    free = Some(slot);
                    break;
                }
                Some(row) if row.get(TARGET).and_then(Value::as_str) == Some(target) => {
                    if !is_valid(&row) {
                        self.adjacency.set(Some(&slot), Row::new().with(VALID, 1))?;
                    }
                    return Ok(());
                }
                Some(_) => {}
            }
        }

        let slot = free.ok_or_else(|| {
            TabulaError::configuration(format!(
                "foreign key '{}' holds {} links for value '{value}'",
                self.name, self.capacity
            ))
        })?;
        self.adjacency
            .set(Some(&slot), Row::new().with(TARGET, target).with(VALID, 1))?;
        trace!(foreign_key = %self.name, %value, target, "link added");
        Ok(())
    }

    /// Returns the keys of the rows `value` is validly linked to.
    pub fn linked_keys(&self, value: &Value) -> TabulaResult<Vec<String>> {
        let mut keys = Vec::new();
        for i in 0..self.capacity {
            let Some(row) = self.adjacency.get(&slot_key(value, i))? else {
                break;
            };
            if is_valid(&row) {
                if let Some(target) = row.get(TARGET).and_then(Value::as_str) {
                    keys.push(target.to_string());
                }
            }
        }
        Ok(keys)
    }

    /// Returns the records linked to `record`, each under `alias`.
    ///
    /// Links to rows that no longer exist are skipped.
    pub fn get_foreign_records(
        &self,
        record: &Record,
        alias: Option<&str>,
    ) -> TabulaResult<Resultset> {
        let mut resultset = Resultset::new();
        let value = self.source_value(record.key(), record.data());
        if value.is_null() {
            return Ok(resultset);
        }

        let target = self.resolver.resolve(&self.to_table)?;
        let alias = alias.unwrap_or(&self.to_table);
        for key in self.linked_keys(&value)? {
            match target.get(&key)? {
                Some(row) => resultset.push(RecordCollection::single(
                    alias,
                    Record::new(self.to_table.clone(), key, row),
                )),
                None => warn!(
                    foreign_key = %self.name,
                    table = %self.to_table,
                    key = %key,
                    "linked row no longer exists"
                ),
            }
        }
        Ok(resultset)
    }

    /// Invalidates every link of `value`. Returns how many were valid.
    pub fn delete_from_foreign_index(&self, value: &Value) -> TabulaResult<usize> {
        let _latch = self.latch.lock();
        let mut deleted = 0;
        for i in 0..self.capacity {
            let slot = slot_key(value, i);
            let Some(row) = self.adjacency.get(&slot)? else {
                break;
            };
            if is_valid(&row) {
                self.adjacency.set(Some(&slot), Row::new().with(VALID, 0))?;
                deleted += 1;
            }
        }
        trace!(foreign_key = %self.name, %value, deleted, "links deleted");
        Ok(deleted)
    }

    /// Invalidates the link from `value` to `target`.
    ///
    /// Returns false when no valid link existed.
    pub fn delete_link(&self, value: &Value, target: &str) -> TabulaResult<bool> {
        let _latch = self.latch.lock();
        for i in 0..self.capacity {
            let slot = slot_key(value, i);
            let Some(row) = self.adjacency.get(&slot)? else {
                break;
            };
            if row.get(TARGET).and_then(Value::as_str) == Some(target) {
                if !is_valid(&row) {
                    return Ok(false);
                }
                self.adjacency.set(Some(&slot), Row::new().with(VALID, 0))?;
                trace!(foreign_key = %self.name, %value, target, "link deleted");
                return Ok(true);
            }
        }
        Ok(false)
    }

    // =========================================================================
    // Row Maintenance
    // =========================================================================

    /// Updates the links of both halves after row `key` of the owning table
    /// was written.
    pub(crate) fn on_row_set(&self, key: &str, old: Option<&Row>, new: &Row) -> TabulaResult<()> {
        let value = self.source_value(key, new);
        let previous = old.map(|row| self.source_value(key, row));
        if previous.as_ref() == Some(&value) {
            return Ok(());
        }

        match self.direction {
            ForeignKeyDirection::From => {
                let reflected = self.reflected()?;
                if let Some(previous) = previous.filter(|v| !v.is_null()) {
                    reflected.delete_link(&previous, key)?;
                }
                if value.is_null() {
                    return Ok(());
                }
                for target in self.target_keys(&value)? {
                    self.add_to_foreign_index(&value, &target)?;
                }
                reflected.add_to_foreign_index(&value, key)?;
            }
            ForeignKeyDirection::To => {
                if self.from_field == KEY_COLUMN_NAME {
                    // A new row under a key that was linked before gets back
                    // the links its deletion invalidated.
                    if self.adjacency.exists(&slot_key(&value, 0)) {
                        self.relink(key, &value)?;
                    }
                    return Ok(());
                }
                let partner = self.reflected()?;
                if let Some(previous) = previous.filter(|v| !v.is_null()) {
                    partner.delete_link(&previous, key)?;
                }
                if !value.is_null() {
                    partner.add_to_foreign_index(&value, key)?;
                }
            }
        }
        Ok(())
    }

    /// Removes the links of both halves before row `key` of the owning
    /// table is deleted.
    pub(crate) fn on_row_deleted(&self, key: &str, row: &Row) -> TabulaResult<()> {
        let value = self.source_value(key, row);
        if value.is_null() {
            return Ok(());
        }

        let reflected = self.reflected()?;
        match self.direction {
            ForeignKeyDirection::From => {
                reflected.delete_link(&value, key)?;
            }
            ForeignKeyDirection::To => {
                if self.from_field == KEY_COLUMN_NAME {
                    self.delete_from_foreign_index(&value)?;
                }
                reflected.delete_link(&value, key)?;
            }
        }
        Ok(())
    }

    /// Restores the links between row `key` and the referencing rows that
    /// still hold `value`.
    fn relink(&self, key: &str, value: &Value) -> TabulaResult<()> {
        let referencing = self.resolver.resolve(&self.to_table)?;
        let keys: Vec<String> = referencing
            .records()?
            .into_iter()
            .filter(|record| {
                record
                    .data()
                    .get(&self.to_field)
                    .is_some_and(|field| !field.is_null() && field.to_string() == key)
            })
            .map(|record| record.key().to_string())
            .collect();
        if keys.is_empty() {
            return Ok(());
        }

        self.reflected()?.add_to_foreign_index(value, key)?;
        for referencing_key in &keys {
            self.add_to_foreign_index(value, referencing_key)?;
        }
        trace!(foreign_key = %self.name, key, links = keys.len(), "links restored");
        Ok(())
    }

    fn source_value(&self, key: &str, row: &Row) -> Value {
        if self.from_field == KEY_COLUMN_NAME {
            return Value::Str(key.to_string());
        }
        row.get(&self.from_field).cloned().unwrap_or(Value::Null)
    }

    /// Returns the keys of the `to_table` rows whose `to_field` is `value`.
    fn target_keys(&self, value: &Value) -> TabulaResult<Vec<String>> {
        if self.to_field == KEY_COLUMN_NAME {
            return Ok(vec![value.to_string()]);
        }
        let target = self.resolver.resolve(&self.to_table)?;
        let index = target.index(&[self.to_field.as_str()]).ok_or_else(|| {
            TabulaError::index(format!(
                "table '{}' lost the index on '{}'",
                self.to_table, self.to_field
            ))
        })?;
        index.search_equal(&[value.clone()])
    }
}

fn open_adjacency(registry: &TableRegistry, name: &str, capacity: usize) -> TabulaResult<Arc<Table>> {
    if registry.has_table(name) {
        return registry.get_table(name);
    }
    let table = registry.create_table(name, capacity)?;
    table
        .add_column(Column::string(TARGET, FOREIGN_KEY_TARGET_SIZE))?
        .add_column(Column::int(VALID, 1))?;
    table.create()?;
    Ok(table)
}

fn slot_key(value: &Value, i: usize) -> String {
    format!("{value}_{i}")
}

fn is_valid(row: &Row) -> bool {
    row.get(VALID) == Some(&Value::Int(1))
}
