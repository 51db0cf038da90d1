//! Coffee menu record.
//!
//! # Responsibility
//! - Define the row shape of `t_coffee` in domain terms.
//! - Validate records before they reach storage.
//!
//! # Invariants
//! - `name` is never blank.
//! - `update_time` is refreshed on every successful update.
//! - `create_time` is written once, on insert.
//!
//! # See also
//! - `crate::db::migrations` (`t_coffee`)

use crate::money::Money;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Database-assigned row id.
pub type CoffeeId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CoffeeValidationError {
    #[error("coffee name must not be blank")]
    BlankName,
}

/// One coffee on the menu with its price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coffee {
    /// `None` until the record is first saved.
    pub id: Option<CoffeeId>,
    pub name: String,
    pub price: Money,
    pub create_time: NaiveDateTime,
    pub update_time: NaiveDateTime,
}

impl Coffee {
    /// Creates an unsaved coffee stamped with the current local time.
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        let now = Local::now().naive_local();
        Self {
            id: None,
            name: name.into(),
            price,
            create_time: now,
            update_time: now,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn validate(&self) -> Result<(), CoffeeValidationError> {
        if self.name.trim().is_empty() {
            return Err(CoffeeValidationError::BlankName);
        }
        Ok(())
    }
}
