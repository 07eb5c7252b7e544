//! Product catalog handlers.
//!
//! Reads are public; writes are admin-only (enforced by the role gate).

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use shopfront_core::ProductId;

use super::{JsonBody, Success, parse_id};
use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::{NewProduct, Product};
use crate::state::AppState;

const NOT_FOUND: &str = "Product not found";

/// Body of `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    name: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
}

impl ProductRequest {
    fn validate(&self) -> Result<NewProduct> {
        NewProduct::parse(
            self.name.as_deref(),
            self.description.as_deref(),
            self.price,
        )
        .ok_or_else(|| AppError::BadRequest("All fields are required".to_owned()))
    }
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ProductBody {
    product: Product,
}

fn map_write_error(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::Conflict(_) => AppError::Conflict("Product already exists".to_owned()),
        RepositoryError::NotFound => AppError::NotFound(NOT_FOUND.to_owned()),
        other => AppError::Database(other),
    }
}

/// `GET /products`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Success<ProductList>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Success::new(ProductList { products }))
}

/// `GET /products/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Success<ProductBody>> {
    let id: ProductId = parse_id(&id, NOT_FOUND)?;
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))?;

    Ok(Success::new(ProductBody { product }))
}

/// `POST /products`
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ProductRequest>,
) -> Result<(StatusCode, Success<ProductBody>)> {
    let new_product = body.validate()?;
    let products = ProductRepository::new(state.pool());

    if products.exists_by_name(&new_product.name).await? {
        return Err(AppError::Conflict("Product already exists".to_owned()));
    }

    let product = products
        .create(&new_product)
        .await
        .map_err(map_write_error)?;

    tracing::info!(product_id = %product.id, "Product created");

    Ok((
        StatusCode::CREATED,
        Success::with_message("Product created successfully", ProductBody { product }),
    ))
}

/// `PUT /products/{id}`
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ProductRequest>,
) -> Result<Success<ProductBody>> {
    let new_product = body.validate()?;
    let id: ProductId = parse_id(&id, NOT_FOUND)?;

    let product = ProductRepository::new(state.pool())
        .update(id, &new_product)
        .await
        .map_err(map_write_error)?;

    Ok(Success::with_message(
        "Product updated successfully",
        ProductBody { product },
    ))
}

/// `DELETE /products/{id}`
///
/// Cart lines holding the product go with it.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Success<()>> {
    let id: ProductId = parse_id(&id, NOT_FOUND)?;

    if !ProductRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound(NOT_FOUND.to_owned()));
    }

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Success::with_message("Product deleted successfully", ()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(json: &str) -> ProductRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_valid_request() {
        let product = request(r#"{"name":" Mug ","description":"Ceramic","price":12.5}"#)
            .validate()
            .unwrap();
        assert_eq!(product.name, "Mug");
        assert_eq!(product.price.amount(), Decimal::new(1250, 2));
    }

    #[test]
    fn test_missing_or_blank_fields() {
        for json in [
            r#"{"description":"Ceramic","price":12}"#,
            r#"{"name":"","description":"Ceramic","price":12}"#,
            r#"{"name":"Mug","description":"   ","price":12}"#,
            r#"{"name":"Mug","description":"Ceramic"}"#,
            r#"{"name":"Mug","description":"Ceramic","price":0}"#,
            r#"{"name":"Mug","description":"Ceramic","price":-3}"#,
        ] {
            let err = request(json).validate().unwrap_err();
            assert!(
                matches!(&err, AppError::BadRequest(msg) if msg == "All fields are required"),
                "{json}"
            );
        }
    }
}
