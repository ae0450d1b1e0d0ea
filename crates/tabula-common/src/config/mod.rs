//! Configuration for Tabula.
//!
//! This module provides the configuration carried by a table registry.

mod store;

pub use store::StoreConfig;
