//! Conditions.
//!
//! A condition compares a left element with an optional right element for
//! one row combination. Operand arity is checked when the condition is
//! built, so evaluation only fails on data it cannot interpret.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use tabula_common::{TabulaError, TabulaResult, Value};
use tabula_core::{Operator, RecordCollection};

use crate::element::{ComputedValue, ConditionElement};

/// Operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionOperator {
    /// `left == right`
    Equal,
    /// `left != right`
    NotEqual,
    /// `left < right`
    Inferior,
    /// `left <= right`
    InferiorOrEqual,
    /// `left > right`
    Superior,
    /// `left >= right`
    SuperiorOrEqual,
    /// SQL `LIKE` with `%` and `_` wildcards.
    Like,
    /// Negated `Like`.
    NotLike,
    /// Anchored regular expression match.
    Regex,
    /// Left is null.
    IsNull,
    /// Left is not null.
    IsNotNull,
    /// Left is truthy, or a non-empty list.
    Exists,
    /// Negated `Exists`.
    NotExists,
    /// Left is a member of the right list.
    In,
    /// Left is not a member of the right list.
    NotIn,
}

impl ConditionOperator {
    /// Returns the operator's name.
    pub const fn name(self) -> &'static str {
        match self {
            ConditionOperator::Equal => "equal",
            ConditionOperator::NotEqual => "notEqual",
            ConditionOperator::Inferior => "inferior",
            ConditionOperator::InferiorOrEqual => "inferiorOrEqual",
            ConditionOperator::Superior => "superior",
            ConditionOperator::SuperiorOrEqual => "superiorOrEqual",
            ConditionOperator::Like => "like",
            ConditionOperator::NotLike => "notLike",
            ConditionOperator::Regex => "regex",
            ConditionOperator::IsNull => "isNull",
            ConditionOperator::IsNotNull => "isNotNull",
            ConditionOperator::Exists => "exists",
            ConditionOperator::NotExists => "notExists",
            ConditionOperator::In => "in",
            ConditionOperator::NotIn => "notIn",
        }
    }

    /// Returns true if the operator takes a right operand.
    pub const fn requires_right(self) -> bool {
        !self.is_unary()
    }

    /// Returns true for the operators that only look at the left operand.
    pub const fn is_unary(self) -> bool {
        matches!(
            self,
            ConditionOperator::IsNull
                | ConditionOperator::IsNotNull
                | ConditionOperator::Exists
                | ConditionOperator::NotExists
        )
    }

    /// Returns the index operator answering this comparison, if any.
    pub const fn index_operator(self) -> Option<Operator> {
        match self {
            ConditionOperator::Equal => Some(Operator::Equal),
            ConditionOperator::Inferior => Some(Operator::Inferior),
            ConditionOperator::InferiorOrEqual => Some(Operator::InferiorOrEqual),
            ConditionOperator::Superior => Some(Operator::Superior),
            ConditionOperator::SuperiorOrEqual => Some(Operator::SuperiorOrEqual),
            _ => None,
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A `left OP right` predicate over a row combination.
#[derive(Debug, Clone)]
pub struct Condition {
    left: ConditionElement,
    operator: ConditionOperator,
    right: Option<ConditionElement>,
    /// Compiled pattern of `like`/`regex` when the right side is constant.
    pattern: OnceLock<Regex>,
}

impl Condition {
    /// Builds a condition, checking the operand arity of `operator`.
    ///
    /// Unary operators accept no right operand (a null constant counts as
    /// none); `in` and `notIn` need a list; every other operator needs a
    /// scalar right operand.
    pub fn new(
        left: ConditionElement,
        operator: ConditionOperator,
        right: Option<ConditionElement>,
    ) -> TabulaResult<Self> {
        let right = match right {
            Some(ConditionElement::Const(Value::Null)) if operator.is_unary() => None,
            other => other,
        };

        if left.is_list() {
            return Err(TabulaError::syntax(format!(
                "'{operator}' cannot take a list on its left side"
            )));
        }
        match (&right, operator) {
            (Some(_), op) if op.is_unary() => {
                return Err(TabulaError::syntax(format!(
                    "'{op}' does not accept a right operand"
                )));
            }
            (None, op) if !op.is_unary() => {
                return Err(TabulaError::syntax(format!("'{op}' needs a right operand")));
            }
            (Some(element), ConditionOperator::In | ConditionOperator::NotIn)
                if !element.is_list() =>
            {
                return Err(TabulaError::syntax(format!(
                    "'{operator}' needs a list on its right side"
                )));
            }
            (Some(element), op)
                if element.is_list()
                    && !matches!(op, ConditionOperator::In | ConditionOperator::NotIn) =>
            {
                return Err(TabulaError::syntax(format!(
                    "'{op}' cannot take a list on its right side"
                )));
            }
            _ => {}
        }

        let pattern = OnceLock::new();
        if let Some(source) = right.as_ref().and_then(ConditionElement::as_const) {
            let compiled = match operator {
                ConditionOperator::Like | ConditionOperator::NotLike => Some(like_regex(source)?),
                ConditionOperator::Regex => Some(anchored_regex(source)?),
                _ => None,
            };
            if let Some(regex) = compiled {
                let _ = pattern.set(regex);
            }
        }

        Ok(Self {
            left,
            operator,
            right,
            pattern,
        })
    }

    /// Builds a condition without right operand.
    pub fn unary(left: ConditionElement, operator: ConditionOperator) -> TabulaResult<Self> {
        Self::new(left, operator, None)
    }

    /// Returns the left operand.
    pub fn left(&self) -> &ConditionElement {
        &self.left
    }

    /// Returns the operator.
    pub fn operator(&self) -> ConditionOperator {
        self.operator
    }

    /// Returns the right operand.
    pub fn right(&self) -> Option<&ConditionElement> {
        self.right.as_ref()
    }

    /// Evaluates the condition against a row combination.
    pub fn validate_condition(&self, context: &RecordCollection) -> TabulaResult<bool> {
        let left = self.left.compute_value(context)?;

        if self.operator.is_unary() {
            return Ok(match self.operator {
                ConditionOperator::IsNull => is_null(&left),
                ConditionOperator::IsNotNull => !is_null(&left),
                ConditionOperator::Exists => exists(&left),
                _ => !exists(&left),
            });
        }

        let right = match &self.right {
            Some(element) => element.compute_value(context)?,
            None => return Err(TabulaError::internal("binary condition without right operand")),
        };

        match self.operator {
            ConditionOperator::In | ConditionOperator::NotIn => {
                let ComputedValue::List(values) = right else {
                    return Err(TabulaError::syntax(format!(
                        "'{}' needs a list on its right side",
                        self.operator
                    )));
                };
                let left = left.into_scalar()?;
                let found = values.contains(&left);
                Ok(found == (self.operator == ConditionOperator::In))
            }
            ConditionOperator::Like | ConditionOperator::NotLike => {
                let (left, right) = (left.into_scalar()?, right.into_scalar()?);
                let (Some(subject), Some(pattern)) =
                    (left.to_string_value(), right.to_string_value())
                else {
                    return Ok(false);
                };
                let matched = self.matches(&pattern, &subject, like_regex)?;
                Ok(matched == (self.operator == ConditionOperator::Like))
            }
            ConditionOperator::Regex => {
                let (left, right) = (left.into_scalar()?, right.into_scalar()?);
                let (Some(subject), Some(pattern)) =
                    (left.to_string_value(), right.to_string_value())
                else {
                    return Ok(false);
                };
                self.matches(&pattern, &subject, anchored_regex)
            }
            _ => {
                let ordering = left.into_scalar()?.cmp(&right.into_scalar()?);
                Ok(match self.operator {
                    ConditionOperator::Equal => ordering.is_eq(),
                    ConditionOperator::NotEqual => ordering.is_ne(),
                    ConditionOperator::Inferior => ordering.is_lt(),
                    ConditionOperator::InferiorOrEqual => ordering.is_le(),
                    ConditionOperator::Superior => ordering.is_gt(),
                    _ => ordering.is_ge(),
                })
            }
        }
    }

    fn matches(
        &self,
        pattern: &str,
        subject: &str,
        compile: fn(&Value) -> TabulaResult<Regex>,
    ) -> TabulaResult<bool> {
        if let Some(regex) = self.pattern.get() {
            return Ok(regex.is_match(subject));
        }
        Ok(compile(&Value::string(pattern))?.is_match(subject))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", display_element(&self.left), self.operator)?;
        if let Some(right) = &self.right {
            write!(f, " {}", display_element(right))?;
        }
        Ok(())
    }
}

fn display_element(element: &ConditionElement) -> String {
    match element {
        ConditionElement::Const(value) => value.to_string(),
        ConditionElement::List(values) => {
            let items: Vec<String> = values.iter().map(ToString::to_string).collect();
            format!("[{}]", items.join(", "))
        }
        ConditionElement::Var { field, alias } => format!("{alias}.{field}"),
    }
}

fn is_null(value: &ComputedValue) -> bool {
    matches!(value, ComputedValue::Scalar(Value::Null))
}

fn exists(value: &ComputedValue) -> bool {
    match value {
        ComputedValue::Scalar(value) => value.is_truthy(),
        ComputedValue::List(values) => !values.is_empty(),
    }
}

/// Translates a `LIKE` pattern to an anchored regex.
fn like_regex(pattern: &Value) -> TabulaResult<Regex> {
    let source = pattern.to_string_value().unwrap_or_default();
    let mut translated = String::with_capacity(source.len() + 8);
    translated.push_str("(?s)^");
    let mut literal = [0u8; 4];
    for c in source.chars() {
        match c {
            '%' => translated.push_str(".*"),
            '_' => translated.push('.'),
            other => translated.push_str(&regex::escape(other.encode_utf8(&mut literal))),
        }
    }
    translated.push('$');
    Regex::new(&translated)
        .map_err(|e| TabulaError::syntax(format!("invalid like pattern '{source}': {e}")))
}

fn anchored_regex(pattern: &Value) -> TabulaResult<Regex> {
    let source = pattern.to_string_value().unwrap_or_default();
    Regex::new(&format!("^(?:{source})$"))
        .map_err(|e| TabulaError::syntax(format!("invalid regex '{source}': {e}")))
}
