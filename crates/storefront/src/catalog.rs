//! The Catalog Store boundary.
//!
//! Everything downstream of this module (cart engine, pricing, order builder)
//! consumes one canonical [`CatalogProduct`] shape. Product reads go through
//! an in-memory `moka` cache (5-minute TTL), matching how catalog data is
//! read far more often than it changes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use swiftcart_core::ProductId;

use crate::db::{ProductRepository, RepositoryError};
use crate::models::CatalogProduct;

/// Errors from catalog lookups.
///
/// The order builder recovers from these via fallback pricing; they are a
/// data-quality event, not a checkout blocker.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The underlying product read failed.
    #[error("catalog lookup failed: {0}")]
    Lookup(#[from] RepositoryError),
}

/// Read access to authoritative product data.
///
/// A trait so the order builder can be exercised against an in-memory catalog
/// in tests; production uses [`ProductCatalog`].
pub trait Catalog {
    /// Look up the canonical record for a product.
    fn find_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<CatalogProduct>, CatalogError>> + Send;
}

/// The production catalog store: database reads behind a short-TTL cache.
#[derive(Clone)]
pub struct ProductCatalog {
    inner: Arc<ProductCatalogInner>,
}

struct ProductCatalogInner {
    pool: PgPool,
    cache: Cache<ProductId, CatalogProduct>,
}

impl ProductCatalog {
    /// Create a new catalog store.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(ProductCatalogInner { pool, cache }),
        }
    }
}

impl Catalog for ProductCatalog {
    async fn find_product(
        &self,
        id: ProductId,
    ) -> Result<Option<CatalogProduct>, CatalogError> {
        if let Some(product) = self.inner.cache.get(&id).await {
            debug!("Cache hit for product");
            return Ok(Some(product));
        }

        let product = ProductRepository::new(&self.inner.pool).find(id).await?;

        match product {
            Some(product) => {
                let catalog_product = CatalogProduct::from(&product);
                self.inner.cache.insert(id, catalog_product.clone()).await;
                Ok(Some(catalog_product))
            }
            // Not-found is not cached: a product listed moments later should
            // become visible immediately.
            None => Ok(None),
        }
    }
}
