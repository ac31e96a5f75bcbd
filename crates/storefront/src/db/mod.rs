//! Database operations for storefront `PostgreSQL`.
//!
//! # Database: `swiftcart_storefront`
//!
//! Document-shaped values (the cart items map, order item sequences, address
//! snapshots) are stored as JSONB; everything else is relational.
//!
//! ## Tables
//!
//! - `sessions` - Tower-sessions storage (created by the session store)
//! - `storefront.cart` - One cart document per user (JSONB items map)
//! - `storefront.orders` - Immutable order records (JSONB items + address)
//! - `storefront.address` - User shipping addresses
//! - `storefront.product` - Catalog products
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run on
//! startup via `sqlx::migrate!`.

pub mod addresses;
pub mod carts;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
