//! Condition operands.

use tabula_common::{TabulaError, TabulaResult, Value};
use tabula_core::RecordCollection;

/// One side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionElement {
    /// A literal scalar, possibly null.
    Const(Value),
    /// A literal list, the right side of `in` and `notIn`.
    List(Vec<Value>),
    /// A field of the record bound to `alias`.
    Var {
        /// Field name; `_key` reads the row key.
        field: String,
        /// Alias of the record in the row combination.
        alias: String,
    },
}

/// The value of an element for one row combination.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputedValue {
    /// A single value.
    Scalar(Value),
    /// A list of values.
    List(Vec<Value>),
}

impl ConditionElement {
    /// Creates a literal scalar.
    pub fn constant(value: impl Into<Value>) -> Self {
        ConditionElement::Const(value.into())
    }

    /// Creates the null literal.
    pub fn null() -> Self {
        ConditionElement::Const(Value::Null)
    }

    /// Creates a literal list.
    pub fn list<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        ConditionElement::List(values.into_iter().map(Into::into).collect())
    }

    /// Creates a field reference.
    ///
    /// Both the field and the alias must be non-empty.
    pub fn var(field: impl Into<String>, alias: impl Into<String>) -> TabulaResult<Self> {
        let field = field.into();
        let alias = alias.into();
        if field.is_empty() || alias.is_empty() {
            return Err(TabulaError::syntax(
                "a variable needs both a field name and a table alias",
            ));
        }
        Ok(ConditionElement::Var { field, alias })
    }

    /// Returns `(field, alias)` for a field reference.
    pub fn as_var(&self) -> Option<(&str, &str)> {
        match self {
            ConditionElement::Var { field, alias } => Some((field, alias)),
            _ => None,
        }
    }

    /// Returns the literal of a scalar constant.
    pub fn as_const(&self) -> Option<&Value> {
        match self {
            ConditionElement::Const(value) => Some(value),
            _ => None,
        }
    }

    /// Returns true for a literal list.
    pub fn is_list(&self) -> bool {
        matches!(self, ConditionElement::List(_))
    }

    /// Resolves the element against a row combination.
    ///
    /// A reference to an alias bound to an absent record (left join without
    /// partner) yields null; a reference to an unbound alias fails.
    pub fn compute_value(&self, context: &RecordCollection) -> TabulaResult<ComputedValue> {
        match self {
            ConditionElement::Const(value) => Ok(ComputedValue::Scalar(value.clone())),
            ConditionElement::List(values) => Ok(ComputedValue::List(values.clone())),
            ConditionElement::Var { field, alias } => {
                if !context.contains_alias(alias) {
                    return Err(TabulaError::AliasNotFound {
                        alias: alias.clone(),
                    });
                }
                match context.get(alias) {
                    Some(record) => record.value(field).map(ComputedValue::Scalar),
                    None => Ok(ComputedValue::Scalar(Value::Null)),
                }
            }
        }
    }
}

impl ComputedValue {
    /// Returns the scalar, failing on a list.
    pub fn into_scalar(self) -> TabulaResult<Value> {
        match self {
            ComputedValue::Scalar(value) => Ok(value),
            ComputedValue::List(_) => Err(TabulaError::syntax("a list cannot be compared as a scalar")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_common::ErrorCode;
    use tabula_core::{Record, Row};

    fn context() -> RecordCollection {
        let mut context = RecordCollection::single(
            "u",
            Record::new("user", "7", Row::new().with("name", "john")),
        );
        context.insert("p", None);
        context
    }

    #[test]
    fn test_var_requires_field_and_alias() {
        assert!(ConditionElement::var("name", "u").is_ok());
        let err = ConditionElement::var("", "u").unwrap_err();
        assert_eq!(err.code(), ErrorCode::SyntaxError);
        assert!(ConditionElement::var("name", "").is_err());
    }

    #[test]
    fn test_compute_var() {
        let context = context();
        let name = ConditionElement::var("name", "u").unwrap();
        assert_eq!(
            name.compute_value(&context).unwrap(),
            ComputedValue::Scalar(Value::from("john"))
        );
        let key = ConditionElement::var("_key", "u").unwrap();
        assert_eq!(
            key.compute_value(&context).unwrap(),
            ComputedValue::Scalar(Value::from("7"))
        );
    }

    #[test]
    fn test_compute_absent_and_unknown_alias() {
        let context = context();
        let absent = ConditionElement::var("title", "p").unwrap();
        assert_eq!(
            absent.compute_value(&context).unwrap(),
            ComputedValue::Scalar(Value::Null)
        );
        let unknown = ConditionElement::var("name", "x").unwrap();
        let err = unknown.compute_value(&context).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AliasNotFound);
    }

    #[test]
    fn test_compute_constants() {
        let context = context();
        assert_eq!(
            ConditionElement::list([1, 2]).compute_value(&context).unwrap(),
            ComputedValue::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert!(ComputedValue::List(vec![]).into_scalar().is_err());
    }
}
