//! Core types for Tabula.

mod ids;
mod value;

pub use ids::IndexNodeId;
pub use value::{compare_tuple_prefix, Value};
