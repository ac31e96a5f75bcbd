//! Cart sync gateway.
//!
//! Reconciles the session cart with the server-held per-user cart document.
//! Pushes always carry the full current snapshot, never deltas: in-flight
//! pushes are unordered, and a later-initiated push landing first must still
//! leave the document in a state some client actually saw (last write wins).
//!
//! Sync failure is never surfaced to the user - the cart stays fully usable
//! locally and the next mutation pushes a fresh snapshot anyway.

use sqlx::PgPool;

use swiftcart_core::UserId;
use swiftcart_core::cart::Cart;

use crate::db::{CartRepository, RepositoryError};

/// Gateway between the session cart and the per-user cart document.
#[derive(Clone)]
pub struct CartSyncGateway {
    pool: PgPool,
}

impl CartSyncGateway {
    /// Create a new sync gateway.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fire-and-forget push of a full cart snapshot.
    ///
    /// Spawned so the local mutation never waits on the database; the result
    /// is discarded even if the session has moved on by the time it lands.
    pub fn spawn_push(&self, user_id: UserId, cart: Cart) {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            if let Err(e) = CartRepository::new(&pool).replace(&user_id, &cart).await {
                tracing::error!(user_id = %user_id, error = %e, "Cart sync push failed");
            }
        });
    }

    /// Fetch the server-held cart document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    pub async fn pull(&self, user_id: &UserId) -> Result<Cart, RepositoryError> {
        CartRepository::new(&self.pool).get(user_id).await
    }

    /// Login-time reconciliation.
    ///
    /// Policy: a non-empty server cart wins and overwrites the session cart
    /// (the user's other purchases should not silently vanish on login); an
    /// empty server cart is seeded from the local one. Returns the cart the
    /// session should adopt.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either side of the exchange
    /// fails; callers treat this as a sync failure and keep the local cart.
    pub async fn reconcile_login(
        &self,
        user_id: &UserId,
        local: Cart,
    ) -> Result<Cart, RepositoryError> {
        let server = self.pull(user_id).await?;
        if server.is_empty() {
            CartRepository::new(&self.pool)
                .replace(user_id, &local)
                .await?;
            Ok(local)
        } else {
            Ok(server)
        }
    }
}
