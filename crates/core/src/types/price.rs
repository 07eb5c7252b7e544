//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Quantity;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Zero or negative amount.
    #[error("price must be greater than 0")]
    NotPositive,
    /// Amount does not fit the storage column (`NUMERIC(10, 2)`).
    #[error("price must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A product price in the store currency.
///
/// Always strictly positive and rounded to two fractional digits (half away
/// from zero). Serialized as a JSON number, which is what the client sends
/// and expects back.
///
/// ```
/// use rust_decimal::Decimal;
/// use shopfront_core::Price;
///
/// let price = Price::new(Decimal::new(19_999, 3)).unwrap();
/// assert_eq!(price.amount(), Decimal::new(2000, 2));
/// assert!(Price::new(Decimal::ZERO).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Number of fractional digits kept.
    pub const SCALE: u32 = 2;

    /// Exclusive upper bound (eight integer digits).
    pub const MAX: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotPositive` if the rounded amount is zero or
    /// negative, and `PriceError::TooLarge` if it does not fit in storage.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        let amount = amount.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        if amount >= Self::MAX {
            return Err(PriceError::TooLarge { max: Self::MAX });
        }
        Ok(Self(amount))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Total for `quantity` units at this price.
    #[must_use]
    pub fn times(&self, quantity: Quantity) -> Decimal {
        self.0 * Decimal::from(quantity.get())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Guarded by CHECK (price > 0)
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_and_negative() {
        assert_eq!(Price::new(Decimal::ZERO), Err(PriceError::NotPositive));
        assert_eq!(Price::new(Decimal::new(-5, 0)), Err(PriceError::NotPositive));
        // Rounds to 0.00
        assert_eq!(Price::new(Decimal::new(4, 3)), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_rejects_too_large() {
        assert!(matches!(
            Price::new(Decimal::new(100_000_000, 0)),
            Err(PriceError::TooLarge { .. })
        ));
        assert!(Price::new(Decimal::new(9_999_999_999, 2)).is_ok());
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        let price = Price::new(Decimal::new(10_005, 3)).unwrap();
        assert_eq!(price.amount(), Decimal::new(1001, 2));
    }

    #[test]
    fn test_times_quantity() {
        let price = Price::new(Decimal::new(1250, 2)).unwrap();
        let quantity = Quantity::new(3).unwrap();
        assert_eq!(price.times(quantity), Decimal::new(3750, 2));
    }

    #[test]
    fn test_serializes_as_number() {
        let price = Price::new(Decimal::new(1999, 2)).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "19.99");
    }

    #[test]
    fn test_deserializes_numbers() {
        let price: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(price.amount(), Decimal::new(1999, 2));

        let price: Price = serde_json::from_str("5").unwrap();
        assert_eq!(price.amount(), Decimal::new(5, 0));

        assert!(serde_json::from_str::<Price>("0").is_err());
        assert!(serde_json::from_str::<Price>("-1.5").is_err());
    }

    #[test]
    fn test_display_two_decimals() {
        let price = Price::new(Decimal::new(5, 0)).unwrap();
        assert_eq!(price.to_string(), "5.00");
    }
}
