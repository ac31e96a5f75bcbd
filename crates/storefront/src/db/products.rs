//! Product repository.
//!
//! Rows are normalized into the canonical [`Product`] shape here, at the
//! Catalog Store boundary: offer prices that are negative are dropped rather
//! than propagated into cart or pricing logic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use swiftcart_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::{NewProduct, Product};

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    seller_id: String,
    name: String,
    description: String,
    category: String,
    price: Decimal,
    offer_price: Option<Decimal>,
    image_urls: Json<Vec<String>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let seller_id = UserId::new(row.seller_id).ok_or_else(|| {
            RepositoryError::DataCorruption("empty seller id on product".to_owned())
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            seller_id,
            name: row.name,
            description: row.description,
            category: row.category,
            price: row.price.max(Decimal::ZERO),
            // Negative offers can only come from bad writes; drop them here
            // so downstream pricing never sees them.
            offer_price: row.offer_price.filter(|p| *p >= Decimal::ZERO),
            image_urls: row.image_urls.0,
            created_at: row.created_at,
        })
    }
}

const COLUMNS: &str =
    "id, seller_id, name, description, category, price, offer_price, image_urls, created_at";

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// List all products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS} FROM storefront.product ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// List a seller's products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_seller(&self, seller_id: &UserId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS} FROM storefront.product WHERE seller_id = $1 ORDER BY created_at DESC"
        ))
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO storefront.product
                (id, seller_id, name, description, category, price, offer_price, image_urls)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "
        ))
        .bind(ProductId::generate())
        .bind(&product.seller_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.offer_price)
        .bind(Json(&product.image_urls))
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }
}
