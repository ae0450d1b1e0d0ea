//! Scalar cell values.
//!
//! `Value` is the tagged union stored in table cells, compared inside
//! index tuples and produced by query conditions.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar cell value.
///
/// Integers and floats compare numerically with each other, `Null` sorts
/// before every other value and numbers sort before strings. The ordering
/// is total so it can drive index descent and `ORDER BY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    Null,
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    Str(String),
}

impl Value {
    /// Creates a string value.
    pub fn string(v: impl Into<String>) -> Self {
        Value::Str(v.into())
    }

    /// Returns true if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value is numeric.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Returns true if this value is truthy.
    ///
    /// Null, zero and the empty string are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
        }
    }

    /// Converts this value to an f64.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Str(s) => s.parse().ok(),
            Value::Null => None,
        }
    }

    /// Returns the string content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Converts this value to a string, `None` for NULL.
    #[must_use]
    pub fn to_string_value(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Returns the name of the runtime type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }

    /// Rank of the runtime type in the cross-type ordering.
    const fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Str(_) => 2,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    #[allow(clippy::cast_precision_loss)]
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Int(a), Value::Float(b)) => {
                (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Value::Float(a), Value::Int(b)) => {
                a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal)
            }
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Compares two tuples lexicographically over the fields of `probe`.
///
/// Only the first `probe.len()` fields of `stored` take part, so a shorter
/// probe compares against a prefix of the stored tuple. A stored tuple
/// shorter than the probe compares as if padded with nulls.
#[must_use]
pub fn compare_tuple_prefix(stored: &[Value], probe: &[Value]) -> Ordering {
    for (i, item) in probe.iter().enumerate() {
        let ordering = stored.get(i).unwrap_or(&Value::Null).cmp(item);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sorts_first() {
        assert!(Value::Null < Value::Int(i64::MIN));
        assert!(Value::Null < Value::Str(String::new()));
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn test_cross_numeric() {
        assert_eq!(Value::Int(12), Value::Float(12.0));
        assert!(Value::Float(12.5) > Value::Int(12));
        assert!(Value::Int(-3) < Value::Float(-2.5));
    }

    #[test]
    fn test_numbers_before_strings() {
        assert!(Value::Int(1_000_000) < Value::string("0"));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::Float(-0.5).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Float(12.5).to_string(), "12.5");
        assert_eq!(Value::string("john").to_string(), "john");
    }

    #[test]
    fn test_json_shape() {
        let tuple = vec![Value::Int(3), Value::Float(1.5), Value::Null, Value::from("x")];
        let json = serde_json::to_string(&tuple).unwrap();
        assert_eq!(json, r#"[3,1.5,null,"x"]"#);

        let decoded: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert!(matches!(decoded[0], Value::Int(3)));
        assert!(matches!(decoded[1], Value::Float(_)));
        assert!(decoded[2].is_null());
    }

    #[test]
    fn test_compare_tuple_prefix() {
        let stored = vec![Value::Int(50), Value::Int(900)];
        assert_eq!(
            compare_tuple_prefix(&stored, &[Value::Int(50)]),
            Ordering::Equal
        );
        assert_eq!(
            compare_tuple_prefix(&stored, &[Value::Int(50), Value::Int(901)]),
            Ordering::Less
        );
        assert_eq!(
            compare_tuple_prefix(&stored, &[Value::Int(49), Value::Int(1000)]),
            Ordering::Greater
        );
    }
}
