//! Repository layer over the SQLite store.
//!
//! # Responsibility
//! - Define data access contracts for coffee records.
//! - Keep SQL and column conversions out of callers.

pub mod coffee_repo;
