//! # tabula-query
//!
//! Query layer for Tabula tables.
//!
//! This crate provides:
//! - Condition elements, conditions and AND/OR brackets
//! - Extraction of index filters from a where clause
//! - Inner and left joins along foreign keys
//! - `TableSelector`, which plans, joins, filters, sorts and paginates
//!
//! # Example
//!
//! ```rust
//! use tabula_common::StoreConfig;
//! use tabula_core::{Column, Row, TableRegistry};
//! use tabula_query::{Condition, ConditionElement, ConditionOperator, TableSelector};
//!
//! let registry = TableRegistry::new(StoreConfig::default()).unwrap();
//! let table = registry.create_table("testSelect", 10).unwrap();
//! table.add_column(Column::string("name", 256)).unwrap();
//! table.add_column(Column::float("price")).unwrap();
//! table.create().unwrap();
//! table.set(Some("0"), Row::new().with("name", "john").with("price", 12.5)).unwrap();
//! table.set(Some("1"), Row::new().with("name", "paul").with("price", 34.9)).unwrap();
//!
//! let mut selector = TableSelector::new(&registry, "testSelect", None).unwrap();
//! selector
//!     .where_mut()
//!     .first_condition(
//!         Condition::new(
//!             ConditionElement::var("price", "testSelect").unwrap(),
//!             ConditionOperator::Superior,
//!             Some(ConditionElement::constant(15)),
//!         )
//!         .unwrap(),
//!     )
//!     .unwrap();
//!
//! let result = selector.execute().unwrap();
//! assert_eq!(result.len(), 1);
//! assert_eq!(result[0].record("testSelect").unwrap().key(), "1");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bracket;
mod condition;
mod element;
mod join;
mod order_by;
mod result_tree;
mod selector;

pub use bracket::{Bracket, BracketItem, BracketOperator};
pub use condition::{Condition, ConditionOperator};
pub use element::{ComputedValue, ConditionElement};
pub use join::{Join, JoinType};
pub use order_by::{OrderByField, OrderDirection};
pub use result_tree::ResultTree;
pub use selector::TableSelector;
