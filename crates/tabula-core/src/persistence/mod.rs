//! Table snapshot persistence.
//!
//! A persistence channel writes a table's schema and rows somewhere and
//! reads them back into a fresh, created table. Indexes and foreign keys
//! are not part of a snapshot; they are declared again after loading.

mod json_file;
mod snapshot;

pub use json_file::JsonFileChannel;
pub use snapshot::{ColumnSnapshot, TableSnapshot};

use std::fmt;

use tabula_common::TabulaResult;

use crate::table::Table;

/// A destination tables can be persisted to and loaded from.
pub trait PersistenceChannel: Send + Sync + fmt::Debug {
    /// Writes `table` under `name`.
    fn persist(&self, name: &str, table: &Table) -> TabulaResult<()>;

    /// Reads the table stored under `name`.
    fn load(&self, name: &str) -> TabulaResult<Table>;
}
