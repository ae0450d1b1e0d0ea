//! AND/OR chains of conditions.

use std::collections::HashMap;
use std::sync::Arc;

use tabula_common::{TabulaError, TabulaResult};
use tabula_core::{IndexFilter, RecordCollection, Table};

use crate::condition::Condition;
use crate::element::ConditionElement;

/// Connective between two consecutive bracket items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BracketOperator {
    /// Both sides hold.
    And,
    /// Either side holds.
    Or,
}

/// One member of a bracket.
#[derive(Debug, Clone)]
pub enum BracketItem {
    /// A single condition.
    Condition(Condition),
    /// A nested bracket.
    Bracket(Bracket),
}

impl BracketItem {
    fn validate(&self, context: &RecordCollection) -> TabulaResult<bool> {
        match self {
            BracketItem::Condition(condition) => condition.validate_condition(context),
            BracketItem::Bracket(bracket) => bracket.validate_bracket(context),
        }
    }
}

/// A chain `item (op item)*`.
///
/// Every item is evaluated before the chain is folded left to right. An
/// AND step returns false as soon as either side is false; an OR step
/// returns true as soon as either side is true. A chain that never returns
/// early yields the value set by its last step, so mixed chains do not
/// follow operator precedence; nest brackets to group them.
///
/// # Example
///
/// ```rust
/// use tabula_query::{Bracket, Condition, ConditionElement, ConditionOperator};
///
/// let price = || ConditionElement::var("price", "p").unwrap();
/// let mut bracket = Bracket::new();
/// bracket
///     .first_condition(
///         Condition::new(price(), ConditionOperator::Superior, Some(ConditionElement::constant(10))).unwrap(),
///     )
///     .unwrap()
///     .and_condition(
///         Condition::new(price(), ConditionOperator::Inferior, Some(ConditionElement::constant(20))).unwrap(),
///     )
///     .unwrap();
/// assert_eq!(bracket.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Bracket {
    items: Vec<BracketItem>,
    operators: Vec<BracketOperator>,
}

impl Bracket {
    /// Creates an empty bracket, which always holds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the bracket has no item.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the items.
    pub fn items(&self) -> &[BracketItem] {
        &self.items
    }

    /// Returns the connectives, one fewer than the items.
    pub fn operators(&self) -> &[BracketOperator] {
        &self.operators
    }

    // =========================================================================
    // Building
    // =========================================================================

    /// Sets the first item to a condition.
    pub fn first_condition(&mut self, condition: Condition) -> TabulaResult<&mut Self> {
        self.push_first(BracketItem::Condition(condition))
    }

    /// Sets the first item to a nested bracket.
    pub fn first_bracket(&mut self, bracket: Bracket) -> TabulaResult<&mut Self> {
        self.push_first(BracketItem::Bracket(bracket))
    }

    /// Appends `AND condition`.
    pub fn and_condition(&mut self, condition: Condition) -> TabulaResult<&mut Self> {
        self.push(BracketOperator::And, BracketItem::Condition(condition))
    }

    /// Appends `OR condition`.
    pub fn or_condition(&mut self, condition: Condition) -> TabulaResult<&mut Self> {
        self.push(BracketOperator::Or, BracketItem::Condition(condition))
    }

    /// Appends `AND (bracket)`.
    pub fn and_bracket(&mut self, bracket: Bracket) -> TabulaResult<&mut Self> {
        self.push(BracketOperator::And, BracketItem::Bracket(bracket))
    }

    /// Appends `OR (bracket)`.
    pub fn or_bracket(&mut self, bracket: Bracket) -> TabulaResult<&mut Self> {
        self.push(BracketOperator::Or, BracketItem::Bracket(bracket))
    }

    fn push_first(&mut self, item: BracketItem) -> TabulaResult<&mut Self> {
        if !self.items.is_empty() {
            return Err(TabulaError::syntax(
                "bracket already has a first item; use and/or to extend it",
            ));
        }
        self.items.push(item);
        Ok(self)
    }

    fn push(&mut self, operator: BracketOperator, item: BracketItem) -> TabulaResult<&mut Self> {
        if self.items.is_empty() {
            return Err(TabulaError::syntax(
                "bracket has no first item; set one before chaining",
            ));
        }
        self.operators.push(operator);
        self.items.push(item);
        Ok(self)
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Evaluates the bracket against a row combination.
    pub fn validate_bracket(&self, context: &RecordCollection) -> TabulaResult<bool> {
        let results = self
            .items
            .iter()
            .map(|item| item.validate(context))
            .collect::<TabulaResult<Vec<bool>>>()?;
        Ok(fold(&results, &self.operators))
    }

    /// Extracts the index filters implied by the bracket, per table alias.
    ///
    /// Only a bracket whose connectives are all AND yields filters. Each
    /// top-level `var OP const` or `const OP var` comparison whose field is
    /// covered by an index of the aliased table becomes a filter; the
    /// operator is flipped when the constant is on the left. Nested
    /// brackets are skipped. `tables` maps aliases to their tables.
    pub fn get_optimisations(
        &self,
        tables: &HashMap<String, Arc<Table>>,
    ) -> HashMap<String, Vec<IndexFilter>> {
        let mut optimisations: HashMap<String, Vec<IndexFilter>> = HashMap::new();
        if self.operators.iter().any(|op| *op != BracketOperator::And) {
            return optimisations;
        }

        for item in &self.items {
            let BracketItem::Condition(condition) = item else {
                continue;
            };
            let Some(operator) = condition.operator().index_operator() else {
                continue;
            };
            let Some(right) = condition.right() else {
                continue;
            };

            let (field, alias, value, operator) = match (condition.left(), right) {
                (ConditionElement::Var { field, alias }, ConditionElement::Const(value)) => {
                    (field, alias, value, operator)
                }
                (ConditionElement::Const(value), ConditionElement::Var { field, alias }) => {
                    (field, alias, value, operator.flip())
                }
                _ => continue,
            };

            let Some(table) = tables.get(alias) else {
                continue;
            };
            if !table.has_index_on(field) {
                continue;
            }
            optimisations
                .entry(alias.clone())
                .or_default()
                .push(IndexFilter::new(operator, field.clone(), value.clone()));
        }
        optimisations
    }
}

/// Folds evaluated items with their connectives.
fn fold(results: &[bool], operators: &[BracketOperator]) -> bool {
    let Some((&first, rest)) = results.split_first() else {
        return true;
    };

    let mut result = first;
    for (&value, &operator) in rest.iter().zip(operators) {
        match operator {
            BracketOperator::And => {
                if !value || !result {
                    return false;
                }
                result = true;
            }
            BracketOperator::Or => {
                if result || value {
                    return true;
                }
                result = false;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionOperator;
    use tabula_common::{ErrorCode, StoreConfig, Value};
    use tabula_core::{Column, Operator, Record, Row, TableRegistry};

    use BracketOperator::{And, Or};

    fn context() -> RecordCollection {
        RecordCollection::single("p", Record::new("product", "1", Row::new().with("price", 12)))
    }

    fn constant(holds: bool) -> Condition {
        Condition::new(
            ConditionElement::var("price", "p").unwrap(),
            if holds {
                ConditionOperator::Equal
            } else {
                ConditionOperator::NotEqual
            },
            Some(ConditionElement::constant(12)),
        )
        .unwrap()
    }

    fn price(op: ConditionOperator, value: i64) -> Condition {
        Condition::new(
            ConditionElement::var("price", "p").unwrap(),
            op,
            Some(ConditionElement::constant(value)),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_holds() {
        assert!(Bracket::new().validate_bracket(&context()).unwrap());
        assert!(fold(&[], &[]));
    }

    #[test]
    fn test_fold_pure_and() {
        assert!(fold(&[true, true, true], &[And, And]));
        assert!(!fold(&[true, false, true], &[And, And]));
        assert!(!fold(&[false, true, true], &[And, And]));
        assert!(!fold(&[true, true, false], &[And, And]));
    }

    #[test]
    fn test_fold_pure_or() {
        assert!(!fold(&[false, false, false], &[Or, Or]));
        assert!(fold(&[false, false, true], &[Or, Or]));
        assert!(fold(&[true, false, false], &[Or, Or]));
    }

    #[test]
    fn test_fold_mixed_chains() {
        // true OR x returns at the first step.
        assert!(fold(&[true, false, false], &[Or, And]));
        // false AND x returns at the first step, whatever follows.
        assert!(!fold(&[false, true, true], &[And, Or]));
        // false OR false leaves false, then AND true fails.
        assert!(!fold(&[false, false, true], &[Or, And]));
        // true AND true leaves true, then OR returns true.
        assert!(fold(&[true, true, false], &[And, Or]));
    }

    #[test]
    fn test_validate_bracket() {
        let mut bracket = Bracket::new();
        bracket
            .first_condition(constant(true))
            .unwrap()
            .and_condition(constant(true))
            .unwrap();
        assert!(bracket.validate_bracket(&context()).unwrap());

        bracket.and_condition(constant(false)).unwrap();
        assert!(!bracket.validate_bracket(&context()).unwrap());

        let mut nested = Bracket::new();
        nested
            .first_condition(constant(false))
            .unwrap()
            .or_condition(constant(true))
            .unwrap();
        let mut outer = Bracket::new();
        outer
            .first_bracket(nested)
            .unwrap()
            .and_condition(constant(true))
            .unwrap();
        assert!(outer.validate_bracket(&context()).unwrap());
    }

    #[test]
    fn test_evaluation_errors_propagate() {
        let mut bracket = Bracket::new();
        bracket
            .first_condition(constant(true))
            .unwrap()
            .or_condition(
                Condition::new(
                    ConditionElement::var("price", "x").unwrap(),
                    ConditionOperator::IsNull,
                    None,
                )
                .unwrap(),
            )
            .unwrap();
        let err = bracket.validate_bracket(&context()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AliasNotFound);
    }

    #[test]
    fn test_build_order_is_checked() {
        let mut bracket = Bracket::new();
        let err = bracket.and_condition(constant(true)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SyntaxError);
        bracket.first_condition(constant(true)).unwrap();
        let err = bracket.first_condition(constant(true)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SyntaxError);
        assert_eq!(bracket.len(), 1);
        assert!(bracket.operators().is_empty());
    }

    fn indexed_tables() -> (TableRegistry, HashMap<String, Arc<Table>>) {
        let registry = TableRegistry::new(StoreConfig::for_testing(&std::env::temp_dir())).unwrap();
        let table = registry.create_table("product", 10).unwrap();
        table.add_column(Column::int("price", 4)).unwrap();
        table.add_column(Column::string("name", 32)).unwrap();
        table.create().unwrap();
        table.add_index(&["price"]).unwrap();
        let mut tables = HashMap::new();
        tables.insert("p".to_string(), table);
        (registry, tables)
    }

    #[test]
    fn test_optimisations() {
        let (_registry, tables) = indexed_tables();
        let mut bracket = Bracket::new();
        bracket
            .first_condition(price(ConditionOperator::Superior, 15))
            .unwrap()
            .and_condition(
                Condition::new(
                    ConditionElement::constant(40),
                    ConditionOperator::Superior,
                    Some(ConditionElement::var("price", "p").unwrap()),
                )
                .unwrap(),
            )
            .unwrap()
            .and_condition(
                Condition::new(
                    ConditionElement::var("name", "p").unwrap(),
                    ConditionOperator::Equal,
                    Some(ConditionElement::constant("john")),
                )
                .unwrap(),
            )
            .unwrap()
            .and_condition(price(ConditionOperator::NotEqual, 3))
            .unwrap();

        let optimisations = bracket.get_optimisations(&tables);
        assert_eq!(
            optimisations["p"],
            vec![
                IndexFilter::new(Operator::Superior, "price", 15),
                IndexFilter::new(Operator::Inferior, "price", Value::Int(40)),
            ]
        );
    }

    #[test]
    fn test_no_optimisations_with_or() {
        let (_registry, tables) = indexed_tables();
        let mut bracket = Bracket::new();
        bracket
            .first_condition(price(ConditionOperator::Superior, 15))
            .unwrap()
            .or_condition(price(ConditionOperator::Equal, 3))
            .unwrap();
        assert!(bracket.get_optimisations(&tables).is_empty());
        assert!(Bracket::new().get_optimisations(&tables).is_empty());
    }
}
