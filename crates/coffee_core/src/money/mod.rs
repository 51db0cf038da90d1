//! Money value object stored as an integer amount of minor currency units.
//!
//! # Responsibility
//! - Define the immutable `Money` value and its `CurrencyCode`.
//! - Provide the `MoneyCodec` that translates between persisted integers
//!   and `Money`.
//!
//! # Invariants
//! - `Money` is compared by value: equal currency and equal minor amount.
//! - Any `i64` is a valid minor amount; negative values are credits/refunds.
//! - Arithmetic never mixes currencies and never wraps on overflow.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub mod codec;

pub type MoneyResult<T> = Result<T, MoneyError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch {
        expected: CurrencyCode,
        actual: CurrencyCode,
    },
    #[error("invalid currency code `{0}`; expected three ASCII letters")]
    InvalidCurrencyCode(String),
    #[error("money amount overflows 64-bit minor units")]
    AmountOverflow,
}

/// ISO 4217 style three-letter currency code, always uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// New Taiwan dollar.
    pub const TWD: Self = Self(*b"TWD");

    /// Parses a currency code, accepting lowercase input.
    pub fn new(code: &str) -> MoneyResult<Self> {
        let trimmed = code.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(MoneyError::InvalidCurrencyCode(code.to_string()));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }

    pub fn as_str(&self) -> &str {
        // Construction only admits ASCII letters.
        std::str::from_utf8(&self.0).unwrap_or("XXX")
    }

    /// Number of decimal places of the minor unit, per ISO 4217.
    ///
    /// Only used for display; storage and codec logic work on minor units.
    pub fn decimal_places(&self) -> u32 {
        match &self.0 {
            b"BIF" | b"CLP" | b"DJF" | b"GNF" | b"ISK" | b"JPY" | b"KMF" | b"KRW" | b"PYG"
            | b"RWF" | b"UGX" | b"VND" | b"VUV" | b"XAF" | b"XOF" | b"XPF" => 0,
            b"BHD" | b"IQD" | b"JOD" | b"KWD" | b"LYD" | b"OMR" | b"TND" => 3,
            _ => 2,
        }
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(value: &str) -> MoneyResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = MoneyError;

    fn try_from(value: String) -> MoneyResult<Self> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.as_str().to_string()
    }
}

/// Monetary amount in a single currency, held as minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    currency: CurrencyCode,
    minor_amount: i64,
}

impl Money {
    pub const fn of_minor(currency: CurrencyCode, minor_amount: i64) -> Self {
        Self {
            currency,
            minor_amount,
        }
    }

    pub const fn zero(currency: CurrencyCode) -> Self {
        Self::of_minor(currency, 0)
    }

    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    pub const fn minor_amount(&self) -> i64 {
        self.minor_amount
    }

    pub const fn is_zero(&self) -> bool {
        self.minor_amount == 0
    }

    pub const fn is_negative(&self) -> bool {
        self.minor_amount < 0
    }

    /// Adds two amounts of the same currency.
    ///
    /// # Errors
    /// - `CurrencyMismatch` when `other` uses a different currency.
    /// - `AmountOverflow` when the sum does not fit in `i64`.
    pub fn checked_add(&self, other: &Money) -> MoneyResult<Money> {
        self.ensure_same_currency(other)?;
        let sum = self
            .minor_amount
            .checked_add(other.minor_amount)
            .ok_or(MoneyError::AmountOverflow)?;
        Ok(Self::of_minor(self.currency, sum))
    }

    /// Subtracts `other` from this amount; errors as in [`Money::checked_add`].
    pub fn checked_sub(&self, other: &Money) -> MoneyResult<Money> {
        self.ensure_same_currency(other)?;
        let difference = self
            .minor_amount
            .checked_sub(other.minor_amount)
            .ok_or(MoneyError::AmountOverflow)?;
        Ok(Self::of_minor(self.currency, difference))
    }

    fn ensure_same_currency(&self, other: &Money) -> MoneyResult<()> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                expected: self.currency,
                actual: other.currency,
            });
        }
        Ok(())
    }
}

impl Display for Money {
    /// Formats as `TWD 10.50`, `TWD -5.00` or `JPY 500`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let places = self.currency.decimal_places();
        let sign = if self.is_negative() { "-" } else { "" };
        let magnitude = self.minor_amount.unsigned_abs();
        if places == 0 {
            return write!(f, "{} {sign}{magnitude}", self.currency);
        }

        let scale = 10_u64.pow(places);
        write!(
            f,
            "{} {sign}{}.{:0width$}",
            self.currency,
            magnitude / scale,
            magnitude % scale,
            width = places as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{CurrencyCode, Money, MoneyError};

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD").unwrap()
    }

    #[test]
    fn currency_code_normalizes_case() {
        assert_eq!(CurrencyCode::new("twd").unwrap(), CurrencyCode::TWD);
        assert_eq!(" Twd ".parse::<CurrencyCode>().unwrap().as_str(), "TWD");
    }

    #[test]
    fn currency_code_rejects_malformed_input() {
        for bad in ["", "TW", "TWDX", "T1D", "台幣"] {
            assert_eq!(
                CurrencyCode::new(bad).unwrap_err(),
                MoneyError::InvalidCurrencyCode(bad.to_string())
            );
        }
    }

    #[test]
    fn equality_uses_currency_and_amount() {
        let a = Money::of_minor(CurrencyCode::TWD, 1050);
        assert_eq!(a, Money::of_minor(CurrencyCode::TWD, 1050));
        assert_ne!(a, Money::of_minor(CurrencyCode::TWD, 1051));
        assert_ne!(a, Money::of_minor(usd(), 1050));
    }

    #[test]
    fn checked_arithmetic_rejects_mixed_currency_and_overflow() {
        let twd = Money::of_minor(CurrencyCode::TWD, 100);
        assert_eq!(
            twd.checked_add(&Money::of_minor(CurrencyCode::TWD, -250))
                .unwrap(),
            Money::of_minor(CurrencyCode::TWD, -150)
        );

        let err = twd.checked_sub(&Money::of_minor(usd(), 1)).unwrap_err();
        assert_eq!(
            err,
            MoneyError::CurrencyMismatch {
                expected: CurrencyCode::TWD,
                actual: usd(),
            }
        );

        let max = Money::of_minor(CurrencyCode::TWD, i64::MAX);
        assert_eq!(
            max.checked_add(&Money::of_minor(CurrencyCode::TWD, 1))
                .unwrap_err(),
            MoneyError::AmountOverflow
        );
    }

    #[test]
    fn display_uses_currency_decimal_places() {
        assert_eq!(
            Money::of_minor(CurrencyCode::TWD, 1050).to_string(),
            "TWD 10.50"
        );
        assert_eq!(
            Money::of_minor(CurrencyCode::TWD, -5).to_string(),
            "TWD -0.05"
        );
        let jpy = CurrencyCode::new("JPY").unwrap();
        assert_eq!(Money::of_minor(jpy, 500).to_string(), "JPY 500");
        assert_eq!(
            Money::of_minor(CurrencyCode::TWD, i64::MIN).to_string(),
            "TWD -92233720368547758.08"
        );
    }
}
