//! System-wide constants for Tabula.
//!
//! Reserved names and default capacities shared by the storage and query
//! layers.

// =============================================================================
// Schema Constants
// =============================================================================

/// Name of the pseudo-column that exposes a row's key.
///
/// It can be read like any other field but never declared as a column.
pub const KEY_COLUMN_NAME: &str = "_key";

/// Column names that cannot be declared in a schema.
pub const FORBIDDEN_COLUMN_NAMES: &[&str] = &[KEY_COLUMN_NAME];

/// Maximum column name length in characters.
pub const MAX_COLUMN_NAME_LEN: usize = 256;

/// Default sentinel stored in a null cell.
pub const DEFAULT_NULL_SENTINEL: i64 = -1;

/// Widest integer column in bytes. Larger declared sizes are clamped.
pub const MAX_INT_COLUMN_SIZE: usize = 8;

// =============================================================================
// Index Constants
// =============================================================================

/// Prefix of the backing table of a secondary index.
pub const INDEX_TABLE_PREFIX: &str = "_INDEX_";

/// Default node capacity of an index backing table.
pub const DEFAULT_INDEX_NODE_CAPACITY: usize = 1_048_576;

/// Default capacity of the serialized tuple blob of an index node.
pub const DEFAULT_INDEX_DATA_SIZE: usize = 4096;

/// Default capacity of the serialized key-set blob of an index node (16 MiB).
pub const DEFAULT_INDEX_KEYS_BLOB_SIZE: usize = 16 * 1024 * 1024;

// =============================================================================
// Foreign Key Constants
// =============================================================================

/// Prefix shared by every foreign-key adjacency table.
pub const FOREIGN_KEY_TABLE_PREFIX: &str = "_FOREIGN_KEY_";

/// Prefix of the adjacency table of a "from" foreign key.
pub const FROM_INDEX_TABLE_PREFIX: &str = "_FOREIGN_KEY_FROM_";

/// Prefix of the adjacency table of a "to" (reflected) foreign key.
pub const TO_INDEX_TABLE_PREFIX: &str = "_FOREIGN_KEY_TO_";

/// Default row capacity of an adjacency table, also the probe cap.
pub const DEFAULT_FOREIGN_INDEX_CAPACITY: usize = 1_048_576;

/// Size of the target-key column of an adjacency table.
pub const FOREIGN_KEY_TARGET_SIZE: usize = 256;

// =============================================================================
// Persistence Constants
// =============================================================================

/// Name of the default persistence channel.
pub const DEFAULT_CHANNEL: &str = "DEFAULT";

/// Extension of JSON table snapshots.
pub const JSON_FILE_EXTENSION: &str = "json";

// =============================================================================
// Identifier Constants
// =============================================================================

/// Default bound on key generation retries when a generated key collides.
pub const DEFAULT_MAX_KEY_GENERATION_ATTEMPTS: usize = 1024;

/// Custom epoch of snowflake identifiers (2021-05-03T00:00:00Z, in ms).
pub const SNOWFLAKE_EPOCH_MS: u64 = 1_620_000_000_000;

/// Number of worker bits in a snowflake identifier.
pub const SNOWFLAKE_WORKER_BITS: u32 = 10;

/// Number of sequence bits in a snowflake identifier.
pub const SNOWFLAKE_SEQUENCE_BITS: u32 = 12;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_share_root() {
        assert!(FROM_INDEX_TABLE_PREFIX.starts_with(FOREIGN_KEY_TABLE_PREFIX));
        assert!(TO_INDEX_TABLE_PREFIX.starts_with(FOREIGN_KEY_TABLE_PREFIX));
    }

    #[test]
    fn test_key_column_is_forbidden() {
        assert!(FORBIDDEN_COLUMN_NAMES.contains(&KEY_COLUMN_NAME));
    }
}
