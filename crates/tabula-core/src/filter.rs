//! Index filters.
//!
//! An `IndexFilter` is one `field OP value` predicate that a table can
//! answer from an index instead of a scan.

use std::cmp::Ordering;
use std::fmt;

use tabula_common::{TabulaError, TabulaResult, Value};

/// Comparison operator understood by indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Equal,
    /// `<`
    Inferior,
    /// `<=`
    InferiorOrEqual,
    /// `>`
    Superior,
    /// `>=`
    SuperiorOrEqual,
}

impl Operator {
    /// All operators, in declaration order.
    pub const ALL: [Operator; 5] = [
        Operator::Equal,
        Operator::Inferior,
        Operator::InferiorOrEqual,
        Operator::Superior,
        Operator::SuperiorOrEqual,
    ];

    /// Returns the operator's name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Operator::Equal => "equal",
            Operator::Inferior => "inferior",
            Operator::InferiorOrEqual => "inferiorOrEqual",
            Operator::Superior => "superior",
            Operator::SuperiorOrEqual => "superiorOrEqual",
        }
    }

    /// Looks an operator up by name.
    pub fn find_by_name(name: &str) -> TabulaResult<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| TabulaError::NotFound {
                what: format!("operator '{name}'"),
            })
    }

    /// Returns the operator obtained by swapping both operands.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Operator::Equal => Operator::Equal,
            Operator::Inferior => Operator::Superior,
            Operator::InferiorOrEqual => Operator::SuperiorOrEqual,
            Operator::Superior => Operator::Inferior,
            Operator::SuperiorOrEqual => Operator::InferiorOrEqual,
        }
    }

    /// Returns true if `stored OP probe` holds, given `stored.cmp(probe)`.
    #[must_use]
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Operator::Equal => ordering == Ordering::Equal,
            Operator::Inferior => ordering == Ordering::Less,
            Operator::InferiorOrEqual => ordering != Ordering::Greater,
            Operator::Superior => ordering == Ordering::Greater,
            Operator::SuperiorOrEqual => ordering != Ordering::Less,
        }
    }

    /// Returns true for `<` and `<=`.
    #[must_use]
    pub const fn is_inferior(self) -> bool {
        matches!(self, Operator::Inferior | Operator::InferiorOrEqual)
    }

    /// Returns true for `>` and `>=`.
    #[must_use]
    pub const fn is_superior(self) -> bool {
        matches!(self, Operator::Superior | Operator::SuperiorOrEqual)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A `field OP value` predicate answerable by an index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexFilter {
    /// Comparison operator.
    pub operator: Operator,
    /// Indexed field.
    pub field: String,
    /// Constant operand.
    pub value: Value,
}

impl IndexFilter {
    /// Creates a filter.
    pub fn new(operator: Operator, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            operator,
            field: field.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for IndexFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_name() {
        for op in Operator::ALL {
            assert_eq!(Operator::find_by_name(op.name()).unwrap(), op);
        }
        assert!(Operator::find_by_name("like").is_err());
    }

    #[test]
    fn test_flip() {
        assert_eq!(Operator::Inferior.flip(), Operator::Superior);
        assert_eq!(Operator::SuperiorOrEqual.flip(), Operator::InferiorOrEqual);
        for op in Operator::ALL {
            assert_eq!(op.flip().flip(), op);
        }
    }

    #[test]
    fn test_accepts() {
        assert!(Operator::InferiorOrEqual.accepts(Ordering::Equal));
        assert!(!Operator::Inferior.accepts(Ordering::Equal));
        assert!(Operator::Superior.accepts(Ordering::Greater));
        assert!(!Operator::SuperiorOrEqual.accepts(Ordering::Less));
    }
}
