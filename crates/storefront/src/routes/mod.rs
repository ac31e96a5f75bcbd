//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Session cart (works unauthenticated)
//! GET  /cart                   - Cart with totals (?promo= optional)
//! POST /cart/add               - Add product (catalog-resolved)
//! POST /cart/update            - Set line quantity (<= 0 removes)
//! POST /cart/remove            - Remove line
//! GET  /cart/count             - Cart count badge
//! POST /cart/promo             - Validate promo code against current cart
//! POST /cart/sync              - Login-time reconciliation with server cart
//!
//! # Server-held cart document (requires auth)
//! GET    /api/cart             - Current user's cart document
//! PUT    /api/cart             - Replace cart document (full snapshot)
//! DELETE /api/cart             - Clear cart document (logout cleanup)
//!
//! # Orders
//! POST /api/orders             - Checkout (authoritative re-pricing)
//! GET  /api/orders             - Order history, most recent first
//!
//! # Addresses (requires auth)
//! GET    /api/addresses        - List addresses
//! POST   /api/addresses        - Add address
//! DELETE /api/addresses/{id}   - Remove address
//!
//! # User data (requires auth)
//! GET  /api/user               - Server cart + addresses
//!
//! # Products
//! GET  /api/products           - Public listing, newest first
//! GET  /api/products/{id}      - Product detail
//! GET  /api/products/seller    - Seller's own listings (seller only)
//! POST /api/products           - List a product (seller only, multipart)
//! ```

pub mod account;
pub mod addresses;
pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Create the session cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
        .route("/promo", post(cart::apply_promo))
        .route("/sync", post(cart::sync))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/", post(orders::create).get(orders::list))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/seller", get(products::seller_index))
        .route("/{id}", get(products::show))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route("/{id}", delete(addresses::delete))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Session cart
        .nest("/cart", cart_routes())
        // Server-held cart document
        .route(
            "/api/cart",
            get(cart::get_document)
                .put(cart::replace_document)
                .delete(cart::clear_document),
        )
        // Orders
        .nest("/api/orders", order_routes())
        // Products
        .nest("/api/products", product_routes())
        // Addresses
        .nest("/api/addresses", address_routes())
        // User data
        .route("/api/user", get(account::show))
}
