//! Column definitions.
//!
//! A column has a name, a storage type and a byte size. Integer sizes are
//! clamped to eight bytes and floats always occupy eight.

use std::fmt;

use serde::{Deserialize, Serialize};
use tabula_common::{
    TabulaError, TabulaResult, Value, DEFAULT_NULL_SENTINEL, FORBIDDEN_COLUMN_NAMES,
    MAX_COLUMN_NAME_LEN, MAX_INT_COLUMN_SIZE,
};

use crate::cell;

/// Storage type of a column.
///
/// The numeric codes are the ones written in table snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ColumnType {
    /// Signed integer, up to 8 bytes.
    Int,
    /// 64-bit floating point.
    Float,
    /// Bounded string.
    String,
}

impl ColumnType {
    /// Returns the snapshot code of this type.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            ColumnType::Int => 1,
            ColumnType::Float => 2,
            ColumnType::String => 3,
        }
    }

    /// Returns the type for a snapshot code.
    pub fn from_code(code: u8) -> TabulaResult<Self> {
        match code {
            1 => Ok(ColumnType::Int),
            2 => Ok(ColumnType::Float),
            3 => Ok(ColumnType::String),
            other => Err(TabulaError::serialization(format!(
                "unknown column type code {other}"
            ))),
        }
    }

    /// Returns true if the type requires an explicit size.
    #[must_use]
    pub const fn requires_size(self) -> bool {
        !matches!(self, ColumnType::Float)
    }

    /// Returns the type name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::String => "string",
        }
    }
}

impl TryFrom<u8> for ColumnType {
    type Error = TabulaError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<ColumnType> for u8 {
    fn from(ty: ColumnType) -> Self {
        ty.code()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A column definition.
///
/// Construction never fails; the definition is checked when it is added
/// to a table, where the table name is known.
///
/// # Example
///
/// ```rust
/// use tabula_core::{Column, ColumnType};
///
/// let name = Column::string("name", 64);
/// let price = Column::float("price");
/// assert_eq!(name.column_type(), ColumnType::String);
/// assert_eq!(price.size(), 8);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    size: Option<usize>,
    null_value: Value,
}

impl Column {
    /// Creates a column definition.
    ///
    /// `size` is mandatory for integer and string columns.
    pub fn new(name: impl Into<String>, column_type: ColumnType, size: Option<usize>) -> Self {
        let null_value = match column_type {
            ColumnType::Int => Value::Int(DEFAULT_NULL_SENTINEL),
            #[allow(clippy::cast_precision_loss)]
            ColumnType::Float => Value::Float(DEFAULT_NULL_SENTINEL as f64),
            ColumnType::String => Value::Str(DEFAULT_NULL_SENTINEL.to_string()),
        };
        Self {
            name: name.into(),
            column_type,
            size,
            null_value,
        }
    }

    /// Creates an integer column of `size` bytes.
    pub fn int(name: impl Into<String>, size: usize) -> Self {
        Self::new(name, ColumnType::Int, Some(size))
    }

    /// Creates a float column.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Float, None)
    }

    /// Creates a string column holding up to `size` bytes.
    pub fn string(name: impl Into<String>, size: usize) -> Self {
        Self::new(name, ColumnType::String, Some(size))
    }

    /// Overrides the sentinel stored in null cells.
    #[must_use]
    pub fn with_null_value(mut self, null_value: impl Into<Value>) -> Self {
        self.null_value = null_value.into();
        self
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the storage type.
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Returns the effective byte size.
    pub fn size(&self) -> usize {
        match self.column_type {
            ColumnType::Float => 8,
            ColumnType::Int => self.size.unwrap_or(0).min(MAX_INT_COLUMN_SIZE),
            ColumnType::String => self.size.unwrap_or(0),
        }
    }

    /// Returns the declared size, before clamping.
    pub fn declared_size(&self) -> Option<usize> {
        self.size
    }

    /// Returns the sentinel stored in null cells.
    pub fn null_value(&self) -> &Value {
        &self.null_value
    }

    /// Checks the definition against the schema rules of `table`.
    pub(crate) fn validate(&self, table: &str) -> TabulaResult<()> {
        if self.name.is_empty() {
            return Err(TabulaError::malformed_schema(table, "column name is empty"));
        }
        if FORBIDDEN_COLUMN_NAMES.contains(&self.name.as_str()) {
            return Err(TabulaError::malformed_schema(
                table,
                format!("column name '{}' is reserved", self.name),
            ));
        }
        if self.name.chars().count() > MAX_COLUMN_NAME_LEN {
            return Err(TabulaError::malformed_schema(
                table,
                format!("column name exceeds {MAX_COLUMN_NAME_LEN} characters"),
            ));
        }
        if self.column_type.requires_size() {
            match self.size {
                None => {
                    return Err(TabulaError::malformed_schema(
                        table,
                        format!("{} column '{}' requires a size", self.column_type, self.name),
                    ))
                }
                Some(0) => {
                    return Err(TabulaError::malformed_schema(
                        table,
                        format!("column '{}' has size 0", self.name),
                    ))
                }
                Some(_) => {}
            }
        }
        if cell::null_cell(self).is_err() {
            return Err(TabulaError::malformed_schema(
                table,
                format!(
                    "null value {} of column '{}' is not a {} value",
                    self.null_value, self.name, self.column_type
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_common::ErrorCode;

    #[test]
    fn test_type_codes() {
        for ty in [ColumnType::Int, ColumnType::Float, ColumnType::String] {
            assert_eq!(ColumnType::from_code(ty.code()).unwrap(), ty);
        }
        assert!(ColumnType::from_code(9).is_err());
    }

    #[test]
    fn test_int_size_clamped() {
        assert_eq!(Column::int("id", 16).size(), 8);
        assert_eq!(Column::int("id", 2).size(), 2);
        assert_eq!(Column::int("id", 16).declared_size(), Some(16));
    }

    #[test]
    fn test_reserved_name_rejected() {
        let err = Column::int("_key", 4).validate("users").unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedSchema);
    }

    #[test]
    fn test_size_required() {
        assert!(Column::new("name", ColumnType::String, None)
            .validate("users")
            .is_err());
        assert!(Column::new("n", ColumnType::Int, Some(0))
            .validate("users")
            .is_err());
        assert!(Column::float("price").validate("users").is_ok());
    }

    #[test]
    fn test_long_name_rejected() {
        let name = "x".repeat(MAX_COLUMN_NAME_LEN + 1);
        assert!(Column::int(name, 4).validate("users").is_err());
        let name = "x".repeat(MAX_COLUMN_NAME_LEN);
        assert!(Column::int(name, 4).validate("users").is_ok());
    }

    #[test]
    fn test_null_value_must_fit_type() {
        let err = Column::int("a", 4)
            .with_null_value("none")
            .validate("users")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedSchema);
        assert!(Column::float("p").with_null_value(0).validate("users").is_ok());
        assert!(Column::string("c", 1).validate("users").is_ok());
    }

    #[test]
    fn test_default_null_sentinel() {
        assert_eq!(Column::int("a", 4).null_value(), &Value::Int(-1));
        assert_eq!(
            Column::string("a", 4).with_null_value("none").null_value(),
            &Value::from("none")
        );
    }
}
