//! Null-safe cell encoding.
//!
//! Every cell stores a magnitude, a sign flag and a null flag. A null cell
//! holds the column's sentinel so the stored shape never depends on
//! nullness. Decoding a null cell yields `NullValue`; the table maps that
//! error to `Value::Null` before handing rows out.

use tabula_common::{TabulaError, TabulaResult, Value};

use crate::column::{Column, ColumnType};

/// An encoded cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell {
    Int {
        magnitude: u64,
        negative: bool,
        null: bool,
    },
    Float {
        magnitude: f64,
        negative: bool,
        null: bool,
    },
    Text {
        value: String,
        null: bool,
    },
}

impl Cell {
    /// Returns true if the cell holds a null.
    pub(crate) fn is_null(&self) -> bool {
        match self {
            Cell::Int { null, .. } | Cell::Float { null, .. } | Cell::Text { null, .. } => *null,
        }
    }
}

/// Encodes `value` for `column`.
///
/// Integers widen into float columns; every other type disagreement is a
/// `TypeMismatch`.
pub(crate) fn encode(column: &Column, value: &Value) -> TabulaResult<Cell> {
    if value.is_null() {
        return null_cell(column);
    }
    encode_value(column, value, false)
}

/// Builds the null cell of `column`.
///
/// The sentinel must match the column type but is not held to the column
/// size; a null cell is never decoded back into the sentinel.
pub(crate) fn null_cell(column: &Column) -> TabulaResult<Cell> {
    encode_value(column, column.null_value(), true)
}

/// Decodes a cell of `column`.
pub(crate) fn decode(column: &Column, cell: &Cell) -> TabulaResult<Value> {
    if cell.is_null() {
        return Err(TabulaError::NullValue {
            column: column.name().to_string(),
        });
    }
    match cell {
        Cell::Int {
            magnitude,
            negative,
            ..
        } => {
            let signed = if *negative {
                -i128::from(*magnitude)
            } else {
                i128::from(*magnitude)
            };
            i64::try_from(signed).map(Value::Int).map_err(|_| {
                TabulaError::internal(format!(
                    "integer cell of column '{}' out of range",
                    column.name()
                ))
            })
        }
        Cell::Float {
            magnitude,
            negative,
            ..
        } => Ok(Value::Float(if *negative { -magnitude } else { *magnitude })),
        Cell::Text { value, .. } => Ok(Value::Str(value.clone())),
    }
}

/// Decodes a cell, mapping nulls to `Value::Null`.
pub(crate) fn decode_nullable(column: &Column, cell: &Cell) -> TabulaResult<Value> {
    match decode(column, cell) {
        Err(TabulaError::NullValue { .. }) => Ok(Value::Null),
        other => other,
    }
}

fn encode_value(column: &Column, value: &Value, null: bool) -> TabulaResult<Cell> {
    match (column.column_type(), value) {
        (ColumnType::Int, Value::Int(i)) => {
            let magnitude = i.unsigned_abs();
            let bytes = column.size();
            if !null && bytes < 8 && magnitude >> (bytes * 8) != 0 {
                return Err(TabulaError::ValueTooLarge {
                    column: column.name().to_string(),
                    size: significant_bytes(magnitude),
                    max_size: bytes,
                });
            }
            Ok(Cell::Int {
                magnitude,
                negative: *i < 0,
                null,
            })
        }
        #[allow(clippy::cast_precision_loss)]
        (ColumnType::Float, Value::Int(i)) => Ok(Cell::Float {
            magnitude: (*i as f64).abs(),
            negative: *i < 0,
            null,
        }),
        (ColumnType::Float, Value::Float(f)) => Ok(Cell::Float {
            magnitude: f.abs(),
            negative: f.is_sign_negative(),
            null,
        }),
        (ColumnType::String, Value::Str(s)) => {
            if !null && s.len() > column.size() {
                return Err(TabulaError::ValueTooLarge {
                    column: column.name().to_string(),
                    size: s.len(),
                    max_size: column.size(),
                });
            }
            Ok(Cell::Text {
                value: s.clone(),
                null,
            })
        }
        (expected, actual) => Err(TabulaError::TypeMismatch {
            column: column.name().to_string(),
            expected: expected.name().to_string(),
            actual: actual.type_name().to_string(),
        }),
    }
}

fn significant_bytes(magnitude: u64) -> usize {
    (64 - magnitude.leading_zeros() as usize).div_ceil(8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_common::ErrorCode;

    #[test]
    fn test_int_sign_and_magnitude() {
        let column = Column::int("n", 8);
        for v in [0, 42, -42, i64::MAX, i64::MIN] {
            let cell = encode(&column, &Value::Int(v)).unwrap();
            assert_eq!(decode(&column, &cell).unwrap(), Value::Int(v));
        }
    }

    #[test]
    fn test_null_round_trip_uses_sentinel() {
        let column = Column::int("n", 4);
        let cell = encode(&column, &Value::Null).unwrap();
        assert!(cell.is_null());
        assert_eq!(
            cell,
            Cell::Int {
                magnitude: 1,
                negative: true,
                null: true
            }
        );

        let err = decode(&column, &cell).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NullValue);
        assert_eq!(decode_nullable(&column, &cell).unwrap(), Value::Null);
    }

    #[test]
    fn test_null_sentinel_ignores_size() {
        let column = Column::string("flag", 1);
        let cell = null_cell(&column).unwrap();
        assert!(cell.is_null());
        assert_eq!(decode_nullable(&column, &cell).unwrap(), Value::Null);

        let column = Column::int("tiny", 1).with_null_value(i64::MIN);
        assert!(encode(&column, &Value::Null).unwrap().is_null());

        let column = Column::int("n", 4).with_null_value("none");
        let err = null_cell(&column).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TypeMismatch);
    }

    #[test]
    fn test_int_widens_into_float() {
        let column = Column::float("price");
        let cell = encode(&column, &Value::Int(-3)).unwrap();
        assert_eq!(decode(&column, &cell).unwrap(), Value::Float(-3.0));
    }

    #[test]
    fn test_type_mismatch() {
        let err = encode(&Column::int("n", 4), &Value::Float(1.5)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TypeMismatch);
        let err = encode(&Column::string("s", 4), &Value::Int(1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TypeMismatch);
    }

    #[test]
    fn test_size_limits() {
        let column = Column::int("n", 1);
        assert!(encode(&column, &Value::Int(255)).is_ok());
        assert!(encode(&column, &Value::Int(-255)).is_ok());
        let err = encode(&column, &Value::Int(256)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValueTooLarge);

        let column = Column::string("s", 4);
        assert!(encode(&column, &Value::from("john")).is_ok());
        let err = encode(&column, &Value::from("johnny")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValueTooLarge);
    }
}
