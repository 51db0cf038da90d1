//! Domain records persisted by the coffee store.
//!
//! # Invariants
//! - A record without an id has never been persisted.
//! - Monetary fields are `Money` values; raw integers only exist at the
//!   storage boundary.

pub mod coffee;
