//! Cart document repository.
//!
//! The server-held cart is one JSONB document per user, replaced wholesale on
//! every sync push (last write wins - there is no field-level merge).

use sqlx::PgPool;
use sqlx::types::Json;

use swiftcart_core::UserId;
use swiftcart_core::cart::Cart;

use super::RepositoryError;

/// Repository for per-user cart documents.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart document.
    ///
    /// Returns an empty cart when the user has none. A document that fails to
    /// deserialize is discarded (logged) rather than surfaced: a corrupt cart
    /// must never make the storefront unusable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: &UserId) -> Result<Cart, RepositoryError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT items FROM storefront.cart WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        let Some((items,)) = row else {
            return Ok(Cart::new());
        };

        let mut cart = serde_json::from_value::<Cart>(items).unwrap_or_else(|e| {
            tracing::warn!(user_id = %user_id, error = %e, "Discarding malformed cart document");
            Cart::new()
        });
        cart.retain_valid();
        Ok(cart)
    }

    /// Replace the user's cart document with a full snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn replace(&self, user_id: &UserId, cart: &Cart) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.cart (user_id, items)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET items = EXCLUDED.items, updated_at = now()
            ",
        )
        .bind(user_id)
        .bind(Json(cart))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete the user's cart document. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: &UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.cart WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
