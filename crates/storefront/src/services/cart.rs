//! The session-scoped cart engine.
//!
//! Single source of truth for the current session's cart. Every mutation
//! runs through the core state machine, is written back to the session slot
//! (the "local storage" - best effort, the cart keeps working even if the
//! write fails), and then triggers an asynchronous full-snapshot push to the
//! server-held cart document when the session is authenticated.
//!
//! There is no ambient singleton: an engine is constructed per request from
//! the session handle and passed to whatever handles the interaction.

use tower_sessions::Session;

use swiftcart_core::{ProductId, UserId};
use swiftcart_core::cart::{Cart, CartError};

use crate::models::CatalogProduct;
use crate::models::session::keys;
use crate::services::sync::CartSyncGateway;

/// Session-scoped cart engine.
pub struct CartEngine {
    session: Session,
    user: Option<UserId>,
    sync: CartSyncGateway,
}

impl CartEngine {
    /// Create an engine for one request's session.
    #[must_use]
    pub const fn new(session: Session, user: Option<UserId>, sync: CartSyncGateway) -> Self {
        Self {
            session,
            user,
            sync,
        }
    }

    /// Load the session cart.
    ///
    /// Malformed persisted state is discarded (logged) and replaced with an
    /// empty cart - a corrupt slot must never crash the storefront or wedge
    /// the session.
    pub async fn load(&self) -> Cart {
        match self.session.get::<Cart>(keys::CART).await {
            Ok(Some(mut cart)) => {
                cart.retain_valid();
                cart
            }
            Ok(None) => Cart::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed session cart");
                Cart::new()
            }
        }
    }

    /// Add a catalog product to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidItem`] for a zero quantity; the cart is
    /// unchanged.
    pub async fn add(&self, product: &CatalogProduct, quantity: u32) -> Result<Cart, CartError> {
        let mut cart = self.load().await;
        cart.add_item(product.to_snapshot(), quantity)?;
        self.commit(&cart).await;
        Ok(cart)
    }

    /// Set a line's quantity (zero or less removes it).
    pub async fn update_quantity(&self, product_id: ProductId, quantity: i64) -> Cart {
        let mut cart = self.load().await;
        cart.update_quantity(product_id, quantity);
        self.commit(&cart).await;
        cart
    }

    /// Remove a line. Idempotent.
    pub async fn remove(&self, product_id: ProductId) -> Cart {
        let mut cart = self.load().await;
        cart.remove_item(product_id);
        self.commit(&cart).await;
        cart
    }

    /// Replace the session cart wholesale (login reconciliation).
    pub async fn replace(&self, cart: Cart) -> Cart {
        self.store(&cart).await;
        cart
    }

    /// Reset the session cart to empty.
    ///
    /// Used after successful checkout; the server-held document is cleared
    /// by the order transaction, so no sync push is needed here.
    pub async fn clear_local(&self) {
        self.store(&Cart::new()).await;
    }

    /// Persist to the session slot and fire the sync push.
    async fn commit(&self, cart: &Cart) {
        self.store(cart).await;

        if let Some(user) = &self.user {
            self.sync.spawn_push(user.clone(), cart.clone());
        }
    }

    /// Best-effort write to the session slot.
    async fn store(&self, cart: &Cart) {
        if let Err(e) = self.session.insert(keys::CART, cart).await {
            tracing::error!(error = %e, "Failed to persist session cart");
        }
    }
}
