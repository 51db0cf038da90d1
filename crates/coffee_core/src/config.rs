//! Runtime configuration read from the environment.
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `COFFEE_DB_PATH` | SQLite database file | in-memory database |
//! | `COFFEE_CURRENCY` | Currency of persisted prices | `TWD` |
//! | `COFFEE_LOG_LEVEL` | `trace`, `debug`, `info`, `warn` or `error` | `debug` (debug builds), `info` (release) |
//! | `COFFEE_LOG_DIR` | Absolute directory for rolling log files | logging disabled |
//!
//! Empty values are treated as unset.

use crate::logging::{default_log_level, normalize_level, LoggingConfig, LoggingError};
use crate::money::codec::MoneyCodec;
use crate::money::{CurrencyCode, MoneyError};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "COFFEE_DB_PATH";
pub const CURRENCY_ENV: &str = "COFFEE_CURRENCY";
pub const LOG_LEVEL_ENV: &str = "COFFEE_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "COFFEE_LOG_DIR";

pub const DEFAULT_CURRENCY: CurrencyCode = CurrencyCode::TWD;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("COFFEE_CURRENCY: {source}")]
    InvalidCurrency { source: MoneyError },
    #[error("COFFEE_LOG_LEVEL/COFFEE_LOG_DIR: {source}")]
    InvalidLogging { source: LoggingError },
}

/// Settings needed to open the store and wire the money codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// `None` selects an in-memory database.
    pub db_path: Option<PathBuf>,
    pub currency: CurrencyCode,
    /// `None` leaves logging off.
    pub logging: Option<LoggingConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            currency: DEFAULT_CURRENCY,
            logging: None,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let currency = match value(CURRENCY_ENV) {
            Some(code) => CurrencyCode::new(&code)
                .map_err(|source| ConfigError::InvalidCurrency { source })?,
            None => DEFAULT_CURRENCY,
        };

        let level = match value(LOG_LEVEL_ENV) {
            Some(level) => {
                normalize_level(&level).map_err(|source| ConfigError::InvalidLogging { source })?
            }
            None => default_log_level(),
        };
        let logging = value(LOG_DIR_ENV)
            .map(|dir| LoggingConfig::new(level, dir.trim()))
            .transpose()
            .map_err(|source| ConfigError::InvalidLogging { source })?;

        Ok(Self {
            db_path: value(DB_PATH_ENV).map(PathBuf::from),
            currency,
            logging,
        })
    }

    /// Codec for the configured currency.
    pub fn money_codec(&self) -> MoneyCodec {
        MoneyCodec::new(self.currency)
    }
}
