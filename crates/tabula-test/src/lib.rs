//! # tabula-test
//!
//! Integration tests for Tabula.
//!
//! This crate contains:
//! - Table fixtures shared by the integration tests
//! - Selector scenarios (filters, index plans, joins, pagination)
//! - Foreign-key maintenance tests
//! - Persistence round trips

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Table fixtures
pub mod fixtures;
