//! Lossless translation between persisted minor-unit integers and `Money`.
//!
//! # Invariants
//! - `encode(decode(n)) == n` for every `i64`.
//! - `decode(encode(m)) == m` for every `m` in the configured currency.
//! - The currency never comes from the input; it is fixed per codec.
//!
//! # See also
//! - `crate::convert::money` for the registry entries wrapping each direction.

use super::{CurrencyCode, Money, MoneyError, MoneyResult};

/// Bidirectional money converter bound to one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoneyCodec {
    currency: CurrencyCode,
}

impl MoneyCodec {
    pub const fn new(currency: CurrencyCode) -> Self {
        Self { currency }
    }

    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Reads a persisted amount. Total: every `i64` maps to a value.
    pub const fn decode(&self, raw: i64) -> Money {
        Money::of_minor(self.currency, raw)
    }

    /// Produces the integer to persist for `value`.
    ///
    /// # Errors
    /// - `CurrencyMismatch` when `value` is not in the codec currency.
    pub fn encode(&self, value: &Money) -> MoneyResult<i64> {
        if value.currency() != self.currency {
            return Err(MoneyError::CurrencyMismatch {
                expected: self.currency,
                actual: value.currency(),
            });
        }
        Ok(value.minor_amount())
    }
}

impl Default for MoneyCodec {
    fn default() -> Self {
        Self::new(CurrencyCode::TWD)
    }
}

#[cfg(test)]
mod tests {
    use super::MoneyCodec;
    use crate::money::{CurrencyCode, Money, MoneyError};

    const SAMPLES: &[i64] = &[
        i64::MIN,
        i64::MIN + 1,
        -1_000_000_007,
        -500,
        -1,
        0,
        1,
        99,
        1050,
        4_294_967_296,
        i64::MAX - 1,
        i64::MAX,
    ];

    #[test]
    fn decode_then_encode_returns_raw_value() {
        let codec = MoneyCodec::default();
        for &raw in SAMPLES {
            assert_eq!(codec.encode(&codec.decode(raw)).unwrap(), raw);
        }
    }

    #[test]
    fn encode_then_decode_returns_same_money() {
        let codec = MoneyCodec::new(CurrencyCode::TWD);
        for &raw in SAMPLES {
            let money = Money::of_minor(CurrencyCode::TWD, raw);
            assert_eq!(codec.decode(codec.encode(&money).unwrap()), money);
        }
    }

    #[test]
    fn decode_zero_and_negative_amounts() {
        let codec = MoneyCodec::default();

        let zero = codec.decode(0);
        assert!(zero.is_zero());
        assert_eq!(zero.currency(), CurrencyCode::TWD);

        let refund = codec.decode(-500);
        assert!(refund.is_negative());
        assert_eq!(refund.minor_amount(), -500);
    }

    #[test]
    fn twd_scenario() {
        let codec = MoneyCodec::new(CurrencyCode::new("TWD").unwrap());
        let price = Money::of_minor(CurrencyCode::TWD, 1050);

        assert_eq!(codec.decode(1050), price);
        assert_eq!(codec.encode(&price).unwrap(), 1050);
    }

    #[test]
    fn encode_rejects_other_currency() {
        let codec = MoneyCodec::default();
        let usd = CurrencyCode::new("USD").unwrap();

        let err = codec.encode(&Money::of_minor(usd, 1050)).unwrap_err();
        assert_eq!(
            err,
            MoneyError::CurrencyMismatch {
                expected: CurrencyCode::TWD,
                actual: usd,
            }
        );
    }

    #[test]
    fn decode_ignores_input_for_currency() {
        let jpy = CurrencyCode::new("jpy").unwrap();
        let codec = MoneyCodec::new(jpy);
        assert_eq!(codec.decode(-1).currency(), jpy);
        assert_eq!(codec.currency(), jpy);
    }
}
