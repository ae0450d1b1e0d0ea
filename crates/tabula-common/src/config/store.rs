//! Store configuration structures.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_FOREIGN_INDEX_CAPACITY, DEFAULT_INDEX_KEYS_BLOB_SIZE, DEFAULT_INDEX_NODE_CAPACITY,
    DEFAULT_MAX_KEY_GENERATION_ATTEMPTS, SNOWFLAKE_WORKER_BITS,
};
use crate::error::{TabulaError, TabulaResult};

/// Store configuration.
///
/// # Example
///
/// ```rust
/// use tabula_common::config::StoreConfig;
///
/// let config = StoreConfig::default();
/// assert_eq!(config.data_dir(), std::path::PathBuf::from("/var/lib/tabula/data"));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory of persisted state.
    /// Default: /var/lib/tabula
    pub var_lib_dir: PathBuf,

    /// Name of the snapshot directory under `var_lib_dir`.
    /// Default: data
    pub data_dir_name: String,

    /// Row capacity of every foreign-key adjacency table. Also bounds the
    /// slot probe of a lookup.
    /// Default: 1048576
    pub foreign_index_capacity: usize,

    /// Node capacity of index backing tables.
    /// Default: 1048576
    pub index_node_capacity: usize,

    /// Capacity of the serialized key set of one index node.
    /// Default: 16 MiB
    pub index_keys_blob_size: usize,

    /// Worker id embedded in snowflake identifiers. Must fit in 10 bits.
    /// Default: 1
    pub snowflake_worker_id: u16,

    /// Bound on key generation retries when a generated key collides.
    /// Default: 1024
    pub max_key_generation_attempts: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            var_lib_dir: PathBuf::from("/var/lib/tabula"),
            data_dir_name: "data".to_string(),
            foreign_index_capacity: DEFAULT_FOREIGN_INDEX_CAPACITY,
            index_node_capacity: DEFAULT_INDEX_NODE_CAPACITY,
            index_keys_blob_size: DEFAULT_INDEX_KEYS_BLOB_SIZE,
            snowflake_worker_id: 1,
            max_key_generation_attempts: DEFAULT_MAX_KEY_GENERATION_ATTEMPTS,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration rooted at `var_lib_dir`.
    #[must_use]
    pub fn with_var_lib_dir(var_lib_dir: impl Into<PathBuf>) -> Self {
        Self {
            var_lib_dir: var_lib_dir.into(),
            ..Default::default()
        }
    }

    /// Creates a small configuration for testing, rooted at `dir`.
    #[must_use]
    pub fn for_testing(dir: &Path) -> Self {
        Self {
            var_lib_dir: dir.to_path_buf(),
            data_dir_name: "data".to_string(),
            foreign_index_capacity: 65_536,
            index_node_capacity: 65_536,
            ..Default::default()
        }
    }

    /// Directory holding table snapshots.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.var_lib_dir.join(&self.data_dir_name)
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> TabulaResult<()> {
        if self.data_dir_name.is_empty() {
            return Err(TabulaError::configuration("data_dir_name must not be empty"));
        }

        if self.foreign_index_capacity == 0 {
            return Err(TabulaError::configuration(
                "foreign_index_capacity must be at least 1",
            ));
        }

        if self.index_node_capacity == 0 {
            return Err(TabulaError::configuration(
                "index_node_capacity must be at least 1",
            ));
        }

        if u32::from(self.snowflake_worker_id) >= (1 << SNOWFLAKE_WORKER_BITS) {
            return Err(TabulaError::configuration(format!(
                "snowflake_worker_id must be below {}",
                1 << SNOWFLAKE_WORKER_BITS
            )));
        }

        if self.max_key_generation_attempts == 0 {
            return Err(TabulaError::configuration(
                "max_key_generation_attempts must be at least 1",
            ));
        }

        Ok(())
    }
}
