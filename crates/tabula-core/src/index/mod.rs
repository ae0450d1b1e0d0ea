//! Persistent ordered secondary indexes.
//!
//! An index maps composite tuples of column values to the keys of the rows
//! holding them. Its nodes live in a backing table, named after the
//! indexed table and fields, so the index has no storage of its own.

mod node;
mod tree;

pub use tree::Index;
