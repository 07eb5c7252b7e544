//! Cart line quantities.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Error returned when a quantity is not strictly positive.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("quantity must be greater than 0")]
pub struct QuantityError;

/// Number of units of a product in a cart line.
///
/// Always at least 1; a line whose quantity would drop to zero is removed
/// instead.
///
/// ```
/// use shopfront_core::Quantity;
///
/// assert_eq!(Quantity::new(3).unwrap().get(), 3);
/// assert!(Quantity::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(i32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError` if `value` is zero or negative.
    pub const fn new(value: i32) -> Result<Self, QuantityError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(QuantityError)
        }
    }

    /// The underlying count.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Sum of two quantities, or `None` if it would not fit in an `i32`.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i32::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let value = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(value)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive() {
        assert_eq!(Quantity::new(0), Err(QuantityError));
        assert_eq!(Quantity::new(-3), Err(QuantityError));
    }

    #[test]
    fn test_default_is_one() {
        assert_eq!(Quantity::default(), Quantity::ONE);
        assert_eq!(Quantity::ONE.get(), 1);
    }

    #[test]
    fn test_checked_add() {
        let two = Quantity::new(2).unwrap();
        assert_eq!(Quantity::ONE.checked_add(two).unwrap().get(), 3);
        assert!(Quantity::new(i32::MAX).unwrap().checked_add(Quantity::ONE).is_none());
    }

    #[test]
    fn test_deserialize_validates() {
        let quantity: Quantity = serde_json::from_str("4").unwrap();
        assert_eq!(quantity.get(), 4);
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }
}
