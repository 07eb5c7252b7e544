//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopfront_core::{Price, ProductId};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Unique product name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Trimmed, non-empty description.
    pub description: String,
    /// Positive price.
    pub price: Price,
}

impl NewProduct {
    /// Validate raw product fields.
    ///
    /// Returns `None` when the name or description is blank or the price is
    /// missing, zero, or negative.
    #[must_use]
    pub fn parse(
        name: Option<&str>,
        description: Option<&str>,
        price: Option<rust_decimal::Decimal>,
    ) -> Option<Self> {
        let name = name.map(str::trim).filter(|s| !s.is_empty())?;
        let description = description.map(str::trim).filter(|s| !s.is_empty())?;
        let price = Price::new(price?).ok()?;

        Some(Self {
            name: name.to_owned(),
            description: description.to_owned(),
            price,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_parse_trims_fields() {
        let product =
            NewProduct::parse(Some("  Mug "), Some(" Ceramic "), Some(Decimal::new(1200, 2)))
                .unwrap();
        assert_eq!(product.name, "Mug");
        assert_eq!(product.description, "Ceramic");
        assert_eq!(product.price.amount(), Decimal::new(12, 0));
    }

    #[test]
    fn test_parse_rejects_blank_fields() {
        let price = Some(Decimal::ONE);
        assert!(NewProduct::parse(None, Some("d"), price).is_none());
        assert!(NewProduct::parse(Some("   "), Some("d"), price).is_none());
        assert!(NewProduct::parse(Some("n"), Some(""), price).is_none());
    }

    #[test]
    fn test_parse_rejects_bad_price() {
        assert!(NewProduct::parse(Some("n"), Some("d"), None).is_none());
        assert!(NewProduct::parse(Some("n"), Some("d"), Some(Decimal::ZERO)).is_none());
        assert!(NewProduct::parse(Some("n"), Some("d"), Some(Decimal::NEGATIVE_ONE)).is_none());
    }
}
