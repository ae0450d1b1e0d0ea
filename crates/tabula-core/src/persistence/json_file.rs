//! JSON file persistence channel.

use std::fs;
use std::path::{Path, PathBuf};

use tabula_common::{TabulaError, TabulaResult, JSON_FILE_EXTENSION};
use tracing::debug;

use super::{PersistenceChannel, TableSnapshot};
use crate::table::Table;

/// Stores each table as `<dir>/<name>.json`.
///
/// The directory is created on first use.
#[derive(Debug, Clone)]
pub struct JsonFileChannel {
    dir: PathBuf,
}

impl JsonFileChannel {
    /// Creates a channel writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of the snapshot of table `name`.
    pub fn filename(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{JSON_FILE_EXTENSION}"))
    }
}

impl PersistenceChannel for JsonFileChannel {
    fn persist(&self, name: &str, table: &Table) -> TabulaResult<()> {
        let snapshot = TableSnapshot::capture(name, table)?;
        let bytes =
            serde_json::to_vec(&snapshot).map_err(|e| TabulaError::serialization(e.to_string()))?;

        fs::create_dir_all(&self.dir)?;
        let path = self.filename(name);
        fs::write(&path, bytes)?;
        debug!(table = name, path = %path.display(), "snapshot written");
        Ok(())
    }

    fn load(&self, name: &str) -> TabulaResult<Table> {
        let path = self.filename(name);
        let bytes = fs::read(&path)?;
        let snapshot: TableSnapshot = serde_json::from_slice(&bytes).map_err(|e| {
            TabulaError::serialization(format!("{}: {e}", path.display()))
        })?;
        debug!(table = name, path = %path.display(), rows = snapshot.data.len(), "snapshot read");
        snapshot.restore(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::row::Row;
    use tabula_common::{ErrorCode, Value};
    use tempfile::TempDir;

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let channel = JsonFileChannel::new(dir.path().join("data"));

        let table = Table::new("user", 10);
        table.add_column(Column::string("name", 32)).unwrap();
        table.add_column(Column::int("age", 2)).unwrap();
        table.create().unwrap();
        table.set(Some("1"), Row::new().with("name", "john").with("age", 40)).unwrap();
        table.set(Some("2"), Row::new().with("name", "paul")).unwrap();

        channel.persist("user", &table).unwrap();
        assert!(channel.filename("user").is_file());

        let loaded = channel.load("user").unwrap();
        assert_eq!(loaded.max_rows(), 10);
        assert_eq!(loaded.columns(), table.columns());
        assert_eq!(loaded.get("1").unwrap(), table.get("1").unwrap());
        assert_eq!(loaded.get_value("2", "age").unwrap(), Value::Null);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let channel = JsonFileChannel::new(dir.path());
        let err = channel.load("ghost").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Io);
    }

    #[test]
    fn test_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let channel = JsonFileChannel::new(dir.path());
        fs::write(channel.filename("user"), b"[1, 2").unwrap();
        let err = channel.load("user").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Serialization);
    }
}
