//! Read/write converters that plug `MoneyCodec` into the registry.

use super::{ConversionResult, Converter};
use crate::money::codec::MoneyCodec;
use crate::money::Money;

/// `i64 -> Money`, used when a price column is materialized.
#[derive(Debug, Clone, Copy)]
pub struct MoneyReadConverter {
    codec: MoneyCodec,
}

impl MoneyReadConverter {
    pub const fn new(codec: MoneyCodec) -> Self {
        Self { codec }
    }
}

impl Converter for MoneyReadConverter {
    type Source = i64;
    type Target = Money;

    fn convert(&self, source: i64) -> ConversionResult<Money> {
        Ok(self.codec.decode(source))
    }
}

/// `Money -> i64`, used before a price column is written.
#[derive(Debug, Clone, Copy)]
pub struct MoneyWriteConverter {
    codec: MoneyCodec,
}

impl MoneyWriteConverter {
    pub const fn new(codec: MoneyCodec) -> Self {
        Self { codec }
    }
}

impl Converter for MoneyWriteConverter {
    type Source = Money;
    type Target = i64;

    fn convert(&self, source: Money) -> ConversionResult<i64> {
        Ok(self.codec.encode(&source)?)
    }
}
