//! Fixed-capacity keyed row storage.
//!
//! Rows live in slots. A slot freed by a delete is reused by the next
//! insert, so iteration follows slot order rather than insertion order.

use std::collections::HashMap;

use tabula_common::{TabulaError, TabulaResult};

use crate::cell::Cell;

/// A row as stored in a slot.
#[derive(Debug, Clone)]
pub(crate) struct StoredRow {
    pub(crate) key: String,
    pub(crate) cells: Vec<Cell>,
}

/// Slot-addressed row storage with a hard row capacity.
#[derive(Debug)]
pub(crate) struct RowStore {
    table: String,
    capacity: usize,
    slots: Vec<Option<StoredRow>>,
    positions: HashMap<String, usize>,
    free: Vec<usize>,
}

impl RowStore {
    /// Creates an empty store for `table` holding up to `capacity` rows.
    pub(crate) fn new(table: impl Into<String>, capacity: usize) -> Self {
        Self {
            table: table.into(),
            capacity,
            slots: Vec::new(),
            positions: HashMap::new(),
            free: Vec::new(),
        }
    }

    /// Returns the number of stored rows.
    pub(crate) fn len(&self) -> usize {
        self.positions.len()
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub(crate) fn get(&self, key: &str) -> Option<&[Cell]> {
        let slot = *self.positions.get(key)?;
        self.slots[slot].as_ref().map(|row| row.cells.as_slice())
    }

    /// Returns the slot position of a key.
    pub(crate) fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Inserts or replaces a row, returning the previous cells.
    pub(crate) fn upsert(&mut self, key: &str, cells: Vec<Cell>) -> TabulaResult<Option<Vec<Cell>>> {
        if let Some(&slot) = self.positions.get(key) {
            let previous = self.slots[slot].replace(StoredRow {
                key: key.to_string(),
                cells,
            });
            return Ok(previous.map(|row| row.cells));
        }

        if self.positions.len() >= self.capacity {
            return Err(TabulaError::TableFull {
                table: self.table.clone(),
                capacity: self.capacity,
            });
        }

        let row = StoredRow {
            key: key.to_string(),
            cells,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(row);
                slot
            }
            None => {
                self.slots.push(Some(row));
                self.slots.len() - 1
            }
        };
        self.positions.insert(key.to_string(), slot);
        Ok(None)
    }

    /// Removes a row, returning its cells.
    pub(crate) fn remove(&mut self, key: &str) -> Option<Vec<Cell>> {
        let slot = self.positions.remove(key)?;
        let row = self.slots[slot].take()?;
        self.free.push(slot);
        Some(row.cells)
    }

    /// Returns the first occupied slot at or after `from`.
    pub(crate) fn next_occupied(&self, from: usize) -> Option<usize> {
        (from..self.slots.len()).find(|&slot| self.slots[slot].is_some())
    }

    /// Returns the row in `slot`, if occupied.
    pub(crate) fn at(&self, slot: usize) -> Option<&StoredRow> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Iterates over stored rows in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &StoredRow> {
        self.slots.iter().filter_map(Option::as_ref)
    }
}
