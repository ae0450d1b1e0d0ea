//! Tabula Performance Benchmarks
//!
//! This crate contains benchmarks for the hot paths of Tabula:
//! - Index inserts and range probes
//! - Table writes with index maintenance
//! - Selector scans, index scans and joins
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench -p tabula-bench
//! ```

pub mod utils;
