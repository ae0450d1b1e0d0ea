//! Store error types.
//!
//! Provides the error type shared by tables, indexes, foreign keys and the
//! query selector.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Internal error (bug).
    Internal = 0x0000,

    // Schema errors (0x0100 - 0x01FF)
    /// Invalid column or table definition.
    MalformedSchema = 0x0100,
    /// Table already exists.
    TableExists = 0x0101,
    /// Table storage was never allocated.
    TableNotCreated = 0x0102,

    // Data errors (0x0200 - 0x02FF)
    /// Value type disagrees with the column type.
    TypeMismatch = 0x0200,
    /// Value does not fit in the column.
    ValueTooLarge = 0x0201,
    /// Cell holds a null.
    NullValue = 0x0202,
    /// Table reached its row capacity.
    TableFull = 0x0203,

    // Lookup errors (0x0300 - 0x03FF)
    /// Table not found.
    TableNotFound = 0x0300,
    /// Column not found.
    ColumnNotFound = 0x0301,
    /// Record not found.
    RecordNotFound = 0x0302,
    /// Foreign key not found.
    ForeignKeyNotFound = 0x0303,
    /// Alias not found.
    AliasNotFound = 0x0304,
    /// Persistence channel not found.
    ChannelNotFound = 0x0305,
    /// Named item not found.
    NotFound = 0x0306,

    // Index errors (0x0400 - 0x04FF)
    /// Malformed index or inconsistent index structure.
    Index = 0x0400,

    // Query errors (0x0500 - 0x05FF)
    /// Malformed query construction.
    SyntaxError = 0x0500,

    // Configuration errors (0x0600 - 0x06FF)
    /// Missing or invalid configuration.
    Configuration = 0x0600,
    /// Clock regression detected by an identifier generator.
    ClockMovedBackwards = 0x0601,

    // Access errors (0x0700 - 0x07FF)
    /// Operation not permitted to the caller.
    ForbiddenAction = 0x0700,

    // I/O errors (0x0800 - 0x08FF)
    /// General I/O error.
    Io = 0x0800,
    /// Snapshot encoding or decoding failed.
    Serialization = 0x0801,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Schema",
            0x02 => "Data",
            0x03 => "NotFound",
            0x04 => "Index",
            0x05 => "Query",
            0x06 => "Configuration",
            0x07 => "Access",
            0x08 => "I/O",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for Tabula.
///
/// Every variant is recoverable by the caller; nothing is retried
/// internally.
///
/// # Example
///
/// ```rust
/// use tabula_common::error::{TabulaError, TabulaResult};
///
/// fn lookup(table: &str) -> TabulaResult<()> {
///     Err(TabulaError::TableNotFound { table: table.to_string() })
/// }
///
/// assert!(lookup("users").unwrap_err().is_not_found());
/// ```
#[derive(Debug, Error)]
pub enum TabulaError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Schema Errors
    // ==========================================================================
    /// Invalid column definition or schema change.
    #[error("malformed schema for table '{table}': {message}")]
    MalformedSchema {
        /// The table being defined.
        table: String,
        /// Error message.
        message: String,
    },

    /// Table already exists.
    #[error("table '{table}' already exists")]
    TableExists {
        /// The duplicated table.
        table: String,
    },

    /// The table storage has not been allocated with `create()`.
    #[error("table '{table}' has not been created")]
    TableNotCreated {
        /// The table.
        table: String,
    },

    // ==========================================================================
    // Data Errors
    // ==========================================================================
    /// Type mismatch while encoding a value.
    #[error("type mismatch on column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// The column.
        column: String,
        /// Expected type.
        expected: String,
        /// Actual type.
        actual: String,
    },

    /// Value does not fit in the column.
    #[error("value of size {size} exceeds capacity {max_size} of column '{column}'")]
    ValueTooLarge {
        /// The column.
        column: String,
        /// Actual size.
        size: usize,
        /// Declared column size.
        max_size: usize,
    },

    /// A single-cell read hit a null cell.
    #[error("value of column '{column}' is null")]
    NullValue {
        /// The column.
        column: String,
    },

    /// The table reached its fixed capacity.
    #[error("table '{table}' is full ({capacity} rows)")]
    TableFull {
        /// The table.
        table: String,
        /// Row capacity.
        capacity: usize,
    },

    // ==========================================================================
    // Lookup Errors
    // ==========================================================================
    /// Table not found.
    #[error("table '{table}' not found")]
    TableNotFound {
        /// The missing table.
        table: String,
    },

    /// Column not found.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound {
        /// The missing column.
        column: String,
        /// The table name.
        table: String,
    },

    /// Record not found.
    #[error("record '{key}' not found in table '{table}'")]
    RecordNotFound {
        /// The table name.
        table: String,
        /// The missing key.
        key: String,
    },

    /// Foreign key not found.
    #[error("foreign key '{name}' not found on table '{table}'")]
    ForeignKeyNotFound {
        /// The table name.
        table: String,
        /// The missing foreign key.
        name: String,
    },

    /// Table alias not found in a row combination or query.
    #[error("alias '{alias}' not found")]
    AliasNotFound {
        /// The missing alias.
        alias: String,
    },

    /// Persistence channel not found.
    #[error("persistence channel '{channel}' not defined")]
    ChannelNotFound {
        /// The missing channel.
        channel: String,
    },

    /// Any other named item not found.
    #[error("{what} not found")]
    NotFound {
        /// Description of the missing item.
        what: String,
    },

    // ==========================================================================
    // Index Errors
    // ==========================================================================
    /// Malformed index definition or inconsistent index structure.
    #[error("index error: {message}")]
    Index {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Query Errors
    // ==========================================================================
    /// Malformed query construction.
    #[error("syntax error: {message}")]
    Syntax {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Missing or invalid configuration.
    #[error("configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },

    /// Clock moved backwards while generating an identifier.
    #[error("clock moved backwards: last timestamp {last_ms}ms, now {now_ms}ms")]
    ClockMovedBackwards {
        /// Last timestamp used.
        last_ms: u64,
        /// Current timestamp.
        now_ms: u64,
    },

    // ==========================================================================
    // Access Errors
    // ==========================================================================
    /// The caller is not allowed to perform the action.
    #[error("forbidden action: {action}")]
    ForbiddenAction {
        /// The refused action.
        action: String,
    },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Snapshot encoding or decoding failed.
    #[error("serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl TabulaError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::MalformedSchema { .. } => ErrorCode::MalformedSchema,
            Self::TableExists { .. } => ErrorCode::TableExists,
            Self::TableNotCreated { .. } => ErrorCode::TableNotCreated,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::ValueTooLarge { .. } => ErrorCode::ValueTooLarge,
            Self::NullValue { .. } => ErrorCode::NullValue,
            Self::TableFull { .. } => ErrorCode::TableFull,
            Self::TableNotFound { .. } => ErrorCode::TableNotFound,
            Self::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            Self::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            Self::ForeignKeyNotFound { .. } => ErrorCode::ForeignKeyNotFound,
            Self::AliasNotFound { .. } => ErrorCode::AliasNotFound,
            Self::ChannelNotFound { .. } => ErrorCode::ChannelNotFound,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Index { .. } => ErrorCode::Index,
            Self::Syntax { .. } => ErrorCode::SyntaxError,
            Self::Configuration { .. } => ErrorCode::Configuration,
            Self::ClockMovedBackwards { .. } => ErrorCode::ClockMovedBackwards,
            Self::ForbiddenAction { .. } => ErrorCode::ForbiddenAction,
            Self::Io { .. } => ErrorCode::Io,
            Self::Serialization { .. } => ErrorCode::Serialization,
        }
    }

    /// Returns true if this error reports a missing table, column, record,
    /// foreign key, alias or channel.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TableNotFound { .. }
                | Self::ColumnNotFound { .. }
                | Self::RecordNotFound { .. }
                | Self::ForeignKeyNotFound { .. }
                | Self::AliasNotFound { .. }
                | Self::ChannelNotFound { .. }
                | Self::NotFound { .. }
        )
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a syntax error.
    #[must_use]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    /// Creates an index error.
    #[must_use]
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a schema error for `table`.
    #[must_use]
    pub fn malformed_schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedSchema {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = TabulaError::ColumnNotFound {
            column: "price".to_string(),
            table: "product".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::ColumnNotFound);
        assert_eq!(err.code().category(), "NotFound");
    }

    #[test]
    fn test_error_display() {
        let err = TabulaError::RecordNotFound {
            table: "user".to_string(),
            key: "42".to_string(),
        };
        assert_eq!(err.to_string(), "record '42' not found in table 'user'");
    }

    #[test]
    fn test_not_found() {
        assert!(TabulaError::AliasNotFound {
            alias: "u".to_string()
        }
        .is_not_found());
        assert!(!TabulaError::syntax("bad").is_not_found());
    }

    #[test]
    fn test_categories() {
        assert_eq!(TabulaError::syntax("x").code().category(), "Query");
        assert_eq!(TabulaError::index("x").code().category(), "Index");
        assert_eq!(
            TabulaError::ForbiddenAction {
                action: "destroy".to_string()
            }
            .code()
            .category(),
            "Access"
        );
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TabulaError = io_err.into();
        assert_eq!(err.code(), ErrorCode::Io);
    }
}
