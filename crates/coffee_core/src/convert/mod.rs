//! Type conversion registry used by the persistence layer.
//!
//! # Responsibility
//! - Hold converters keyed by `(source type, target type)`.
//! - Dispatch row read/write conversions to the matching converter.
//!
//! # Invariants
//! - Registration is explicit; nothing is discovered or registered globally.
//! - A registry is immutable once handed to a repository, so it can be
//!   shared across threads without locking.
//! - Converter failures propagate unchanged to the caller.
//!
//! # See also
//! - `crate::money::codec`

use crate::money::codec::MoneyCodec;
use crate::money::{Money, MoneyError};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub mod money;

pub use money::{MoneyReadConverter, MoneyWriteConverter};

pub type ConversionResult<T> = Result<T, ConversionError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("no converter registered for `{from}` -> `{to}`")]
    NotRegistered {
        from: &'static str,
        to: &'static str,
    },
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// One conversion direction, registered under `(Source, Target)`.
pub trait Converter: Send + Sync {
    type Source: 'static;
    type Target: 'static;

    fn convert(&self, source: Self::Source) -> ConversionResult<Self::Target>;
}

type DynConverter<S, T> = Arc<dyn Converter<Source = S, Target = T>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ConversionKey {
    source: TypeId,
    target: TypeId,
}

impl ConversionKey {
    fn of<S: 'static, T: 'static>() -> Self {
        Self {
            source: TypeId::of::<S>(),
            target: TypeId::of::<T>(),
        }
    }
}

struct Entry {
    from: &'static str,
    to: &'static str,
    // Holds a `DynConverter<S, T>` for the key's `S` and `T`.
    converter: Arc<dyn Any + Send + Sync>,
}

/// Lookup table from `(source, target)` type pairs to converters.
#[derive(Default, Clone)]
pub struct ConversionRegistry {
    entries: HashMap<ConversionKey, Arc<Entry>>,
}

impl ConversionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry with both money directions bound to `codec`.
    pub fn with_money_codec(codec: MoneyCodec) -> Self {
        let mut registry = Self::new();
        registry
            .register(MoneyReadConverter::new(codec))
            .register(MoneyWriteConverter::new(codec));
        registry
    }

    /// Registers `converter` for its `Source -> Target` pair, replacing any
    /// previous entry for that pair.
    pub fn register<C>(&mut self, converter: C) -> &mut Self
    where
        C: Converter + 'static,
    {
        let erased: DynConverter<C::Source, C::Target> = Arc::new(converter);
        self.entries.insert(
            ConversionKey::of::<C::Source, C::Target>(),
            Arc::new(Entry {
                from: type_name::<C::Source>(),
                to: type_name::<C::Target>(),
                converter: Arc::new(erased),
            }),
        );
        self
    }

    pub fn contains<S: 'static, T: 'static>(&self) -> bool {
        self.entries.contains_key(&ConversionKey::of::<S, T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts `source` with the converter registered for `S -> T`.
    ///
    /// # Errors
    /// - `NotRegistered` when no converter exists for the pair.
    /// - Whatever the converter itself returns.
    pub fn convert<S: 'static, T: 'static>(&self, source: S) -> ConversionResult<T> {
        let converter = self
            .entries
            .get(&ConversionKey::of::<S, T>())
            .and_then(|entry| {
                (*entry.converter).downcast_ref::<DynConverter<S, T>>()
            })
            .ok_or(ConversionError::NotRegistered {
                from: type_name::<S>(),
                to: type_name::<T>(),
            })?;
        converter.convert(source)
    }

    /// Shorthand for the `i64 -> Money` read direction.
    pub fn read_money(&self, raw: i64) -> ConversionResult<Money> {
        self.convert::<i64, Money>(raw)
    }

    /// Shorthand for the `Money -> i64` write direction.
    pub fn write_money(&self, value: Money) -> ConversionResult<i64> {
        self.convert::<Money, i64>(value)
    }
}

impl Debug for ConversionRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut pairs = self
            .entries
            .values()
            .map(|entry| format!("{} -> {}", entry.from, entry.to))
            .collect::<Vec<_>>();
        pairs.sort();
        f.debug_struct("ConversionRegistry")
            .field("converters", &pairs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConversionError, ConversionRegistry, ConversionResult, Converter};
    use crate::money::codec::MoneyCodec;
    use crate::money::{CurrencyCode, Money, MoneyError};
    use std::sync::Arc;
    use std::thread;

    struct Doubler;

    impl Converter for Doubler {
        type Source = i64;
        type Target = i64;

        fn convert(&self, source: i64) -> ConversionResult<i64> {
            Ok(source * 2)
        }
    }

    struct Tripler;

    impl Converter for Tripler {
        type Source = i64;
        type Target = i64;

        fn convert(&self, source: i64) -> ConversionResult<i64> {
            Ok(source * 3)
        }
    }

    #[test]
    fn empty_registry_reports_missing_pair() {
        let registry = ConversionRegistry::new();
        assert!(registry.is_empty());

        let err = registry.convert::<i64, Money>(1).unwrap_err();
        match err {
            ConversionError::NotRegistered { from, to } => {
                assert_eq!(from, "i64");
                assert!(to.ends_with("Money"), "unexpected target name: {to}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn money_codec_registers_two_independent_directions() {
        let registry = ConversionRegistry::with_money_codec(MoneyCodec::default());

        assert_eq!(registry.len(), 2);
        assert!(registry.contains::<i64, Money>());
        assert!(registry.contains::<Money, i64>());
        assert!(!registry.contains::<i32, Money>());

        let price = registry.read_money(1050).unwrap();
        assert_eq!(price, Money::of_minor(CurrencyCode::TWD, 1050));
        assert_eq!(registry.write_money(price).unwrap(), 1050);
    }

    #[test]
    fn write_direction_surfaces_currency_mismatch_unchanged() {
        let registry = ConversionRegistry::with_money_codec(MoneyCodec::default());
        let usd = CurrencyCode::new("USD").unwrap();

        let err = registry.write_money(Money::of_minor(usd, 1)).unwrap_err();
        assert_eq!(
            err,
            ConversionError::Money(MoneyError::CurrencyMismatch {
                expected: CurrencyCode::TWD,
                actual: usd,
            })
        );
    }

    #[test]
    fn register_replaces_existing_pair() {
        let mut registry = ConversionRegistry::new();
        registry.register(Doubler);
        assert_eq!(registry.convert::<i64, i64>(7).unwrap(), 14);

        registry.register(Tripler);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.convert::<i64, i64>(7).unwrap(), 21);
    }

    #[test]
    fn shared_registry_converts_from_many_threads() {
        let registry = Arc::new(ConversionRegistry::with_money_codec(MoneyCodec::default()));

        let workers = (0..8_i64)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for raw in (worker * 1000)..(worker * 1000 + 200) {
                        let money = registry.read_money(-raw).unwrap();
                        assert_eq!(registry.write_money(money).unwrap(), -raw);
                    }
                })
            })
            .collect::<Vec<_>>();

        for worker in workers {
            worker.join().unwrap();
        }
    }

    #[test]
    fn debug_lists_registered_pairs() {
        let registry = ConversionRegistry::with_money_codec(MoneyCodec::default());
        let rendered = format!("{registry:?}");
        assert!(rendered.contains("i64 -> "), "{rendered}");
        assert!(rendered.contains("Money -> i64"), "{rendered}");
    }
}
