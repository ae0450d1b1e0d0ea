//! # tabula-core
//!
//! Fixed-schema table storage for Tabula.
//!
//! This crate implements:
//! - Typed, null-safe, fixed-capacity row storage (`Table`)
//! - Persistent ordered secondary indexes over composite tuples (`Index`)
//! - Reflected foreign-key pairs backed by adjacency tables (`ForeignKey`)
//! - The table registry that resolves tables by name (`TableRegistry`)
//! - Row key generators and snapshot persistence channels
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TableRegistry                           │
//! │         (resolve by name, destroy, persistence channels)     │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Table                               │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐          │
//! │  │   Columns   │  │   Indexes   │  │ ForeignKeys │          │
//! │  │ (cell codec)│  │ (node rows) │  │ (adjacency) │          │
//! │  └─────────────┘  └─────────────┘  └─────────────┘          │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         RowStore                             │
//! │         (fixed capacity, slot ordered, key addressed)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Indexes and foreign keys persist their own structure in tables of
//! their own, so every piece of state lives in a row store.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cell;
mod column;
mod filter;
mod foreign_key;
mod record;
mod registry;
mod row;
mod row_store;
mod table;

/// Persistent ordered secondary indexes.
pub mod index;

/// Row key generators.
pub mod id_gen;

/// Table snapshot persistence channels.
pub mod persistence;

pub use column::{Column, ColumnType};
pub use filter::{IndexFilter, Operator};
pub use foreign_key::{ForeignKey, ForeignKeyDef, ForeignKeyDirection};
pub use index::Index;
pub use record::{Record, RecordCollection, Resultset};
pub use registry::{DestroyToken, TableRegistry, TableResolver};
pub use row::Row;
pub use table::{Cursor, Table};

pub use tabula_common::{TabulaError, TabulaResult, Value, KEY_COLUMN_NAME};
