//! Coffee menu store on SQLite with prices kept as integer minor units.
//!
//! Prices are `Money` values in the domain and `INTEGER` columns on disk;
//! the `MoneyCodec`, registered in a `ConversionRegistry`, is the only
//! translator between the two.

pub mod config;
pub mod convert;
pub mod db;
pub mod logging;
pub mod model;
pub mod money;
pub mod repo;

pub use config::{ConfigError, StoreConfig};
pub use convert::{
    ConversionError, ConversionRegistry, ConversionResult, Converter, MoneyReadConverter,
    MoneyWriteConverter,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::coffee::{Coffee, CoffeeId, CoffeeValidationError};
pub use money::codec::MoneyCodec;
pub use money::{CurrencyCode, Money, MoneyError, MoneyResult};
pub use repo::coffee_repo::{CoffeeRepository, RepoError, RepoResult, SqliteCoffeeRepository};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
