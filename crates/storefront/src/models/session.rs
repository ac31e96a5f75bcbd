//! Session-stored state.
//!
//! The session is the cart's "local storage": the full cart document is
//! serialized into one slot on every mutation and read back on every request,
//! so the cart works for unauthenticated visitors and survives restarts.

/// Session keys for storefront data.
pub mod keys {
    /// Key for the serialized session cart.
    pub const CART: &str = "cart";
}
