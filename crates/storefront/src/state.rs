//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::catalog::ProductCatalog;
use crate::config::StorefrontConfig;
use crate::services::identity::{IdentityClient, IdentityError};
use crate::services::images::{ImageHostClient, ImageHostError};
use crate::services::sync::CartSyncGateway;

/// Error building application state.
#[derive(Debug, Error)]
pub enum AppStateError {
    #[error("identity client: {0}")]
    Identity(#[from] IdentityError),
    #[error("image host client: {0}")]
    ImageHost(#[from] ImageHostError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: ProductCatalog,
    identity: IdentityClient,
    images: ImageHostClient,
    sync: CartSyncGateway,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an external service client fails to build.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, AppStateError> {
        let catalog = ProductCatalog::new(pool.clone());
        let identity = IdentityClient::new(&config.identity)?;
        let images = ImageHostClient::new(&config.images)?;
        let sync = CartSyncGateway::new(pool.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                identity,
                images,
                sync,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the catalog store.
    #[must_use]
    pub fn catalog(&self) -> &ProductCatalog {
        &self.inner.catalog
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the image host client.
    #[must_use]
    pub fn images(&self) -> &ImageHostClient {
        &self.inner.images
    }

    /// Get a reference to the cart sync gateway.
    #[must_use]
    pub fn sync(&self) -> &CartSyncGateway {
        &self.inner.sync
    }
}
