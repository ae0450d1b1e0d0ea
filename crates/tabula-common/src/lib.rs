//! # tabula-common
//!
//! Common types, errors, and utilities for Tabula.
//!
//! This crate provides the foundational types shared by the storage and
//! query crates:
//!
//! - **Types**: the scalar `Value` sum type and `IndexNodeId`
//! - **Errors**: unified error handling with `TabulaError`
//! - **Config**: the `StoreConfig` carried by a table registry
//! - **Constants**: reserved names and default capacities
//!
//! ## Example
//!
//! ```rust
//! use tabula_common::types::Value;
//! use tabula_common::error::TabulaResult;
//!
//! fn example() -> TabulaResult<()> {
//!     let price = Value::Float(12.5);
//!     assert!(price > Value::Int(12));
//!     assert!(Value::Null < Value::Int(-1));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::StoreConfig;
pub use constants::*;
pub use error::{ErrorCode, TabulaError, TabulaResult};
pub use types::{compare_tuple_prefix, IndexNodeId, Value};
