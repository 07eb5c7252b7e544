//! Seed the catalog with products from a YAML file.
//!
//! ```yaml
//! products:
//!   - name: Ceramic Mug
//!     description: 350 ml, dishwasher safe
//!     price: 12.50
//! ```
//!
//! Entries are validated like `POST /products`; names already in the catalog
//! are skipped so the command can be re-run.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use shopfront_api::db::ProductRepository;
use shopfront_api::error::FieldErrors;
use shopfront_api::models::NewProduct;

use super::{CommandError, connect};

/// Top-level layout of a product seed file.
#[derive(Debug, Deserialize)]
pub struct ProductSeedFile {
    pub products: Vec<ProductSeed>,
}

/// One product entry.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
}

/// Outcome of a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Parse and validate a seed file's contents.
///
/// # Errors
///
/// Returns `CommandError::Yaml` for malformed YAML and `CommandError::Invalid`
/// naming the first bad entry.
pub fn parse_products(content: &str) -> Result<Vec<NewProduct>, CommandError> {
    let file: ProductSeedFile = serde_yaml::from_str(content)?;

    file.products
        .iter()
        .enumerate()
        .map(|(index, seed)| {
            NewProduct::parse(
                seed.name.as_deref(),
                seed.description.as_deref(),
                seed.price,
            )
            .ok_or_else(|| {
                CommandError::Invalid(FieldErrors::single(
                    "products",
                    format!("entry {} needs a name, description and positive price", index + 1),
                ))
            })
        })
        .collect()
}

/// Insert the products listed in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or validated, or a database
/// operation fails.
pub async fn products(file_path: &str) -> Result<SeedSummary, CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading products from file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let new_products = parse_products(&content)?;
    info!(count = new_products.len(), "Parsed seed file");

    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    let mut summary = SeedSummary::default();
    for product in &new_products {
        if repo.exists_by_name(&product.name).await? {
            warn!(name = %product.name, "Product already exists, skipping");
            summary.skipped += 1;
            continue;
        }

        let created = repo.create(product).await?;
        info!(id = %created.id, name = %created.name, "Inserted product");
        summary.inserted += 1;
    }

    info!("Seeding complete!");
    info!("  Products inserted: {}", summary.inserted);
    info!("  Products skipped (already exist): {}", summary.skipped);

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_products() {
        let products = parse_products(
            r"
products:
  - name: Ceramic Mug
    description: 350 ml
    price: 12.50
  - name: '  Tote Bag '
    description: Canvas
    price: 8
",
        )
        .unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products.get(1).unwrap().name, "Tote Bag");
        assert_eq!(products.first().unwrap().price.amount(), Decimal::new(1250, 2));
    }

    #[test]
    fn test_parse_products_rejects_bad_entry() {
        let err = parse_products(
            r"
products:
  - name: Ceramic Mug
    description: 350 ml
    price: 12.50
  - name: Free Lunch
    description: Nope
    price: 0
",
        )
        .unwrap_err();

        let CommandError::Invalid(errors) = err else {
            panic!("expected validation error, got {err}");
        };
        assert!(errors.get("products").unwrap().starts_with("entry 2"));
    }

    #[test]
    fn test_parse_products_rejects_malformed_yaml() {
        assert!(matches!(
            parse_products("products: [unterminated"),
            Err(CommandError::Yaml(_))
        ));
    }

    #[test]
    fn test_bundled_seed_file_is_valid() {
        let content = include_str!("../../seeds/products.yaml");
        assert!(!parse_products(content).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");

        assert!(matches!(
            products(path.to_str().unwrap()).await,
            Err(CommandError::Io { .. })
        ));
    }
}
