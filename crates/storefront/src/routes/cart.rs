//! Cart route handlers.
//!
//! Two surfaces live here:
//!
//! - `/cart/*` - the session cart: optimistic local-first mutations that
//!   work with or without an authenticated user, each followed by a
//!   fire-and-forget sync push.
//! - `/api/cart` - the server-held cart document (get / full replace),
//!   which is what sync pushes target.

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use swiftcart_core::ProductId;
use swiftcart_core::cart::{Cart, CartItem};
use swiftcart_core::pricing::{PromoState, Totals, quote};

use crate::db::CartRepository;
use crate::error::{AppError, Result};
use crate::middleware::{OptionalIdentity, RequireIdentity};
use crate::services::CartEngine;
use crate::state::AppState;

// =============================================================================
// Response Views
// =============================================================================

/// Cart line display data.
#[derive(Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub offer_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub quantity: u32,
    #[serde(serialize_with = "swiftcart_core::types::money::serialize_round2")]
    pub line_total: Decimal,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name.clone(),
            unit_price: item.unit_price,
            offer_price: item.offer_price,
            image_url: item.image_url.clone(),
            quantity: item.quantity,
            line_total: item.line_total(),
        }
    }
}

/// Cart display data: lines plus recomputed totals.
///
/// Totals are recomputed from current cart state on every response and
/// rounded once for presentation.
#[derive(Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub count: u64,
    pub totals: Totals,
}

impl CartView {
    fn build(cart: &Cart, promo: &PromoState) -> Self {
        Self {
            items: cart.items().map(CartItemView::from).collect(),
            count: cart.count(),
            totals: quote(cart, promo).rounded(),
        }
    }
}

// =============================================================================
// Session Cart
// =============================================================================

fn engine(state: &AppState, session: Session, user: OptionalIdentity) -> CartEngine {
    CartEngine::new(session, user.0, state.sync().clone())
}

#[derive(Debug, Deserialize)]
pub struct ShowQuery {
    pub promo: Option<String>,
}

/// Current session cart with totals.
///
/// An invalid promo query is non-fatal: totals come back without a discount
/// and `promo_valid` is false.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    user: OptionalIdentity,
    Query(query): Query<ShowQuery>,
) -> impl IntoResponse {
    let cart = engine(&state, session, user).load().await;

    let (promo, promo_valid) = match query.promo.as_deref() {
        Some(code) => match PromoState::parse(code) {
            Ok(promo) => (promo, Some(true)),
            Err(_) => (PromoState::none(), Some(false)),
        },
        None => (PromoState::none(), None),
    };

    Json(json!({
        "success": true,
        "cart": CartView::build(&cart, &promo),
        "promo_valid": promo_valid,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Add a catalog product to the session cart.
#[instrument(skip(state, session, user))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    user: OptionalIdentity,
    Json(form): Json<AddForm>,
) -> Result<impl IntoResponse> {
    use crate::catalog::Catalog;

    let product = state
        .catalog()
        .find_product(form.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product not found: {}", form.product_id)))?;

    let cart = engine(&state, session, user)
        .add(&product, form.quantity.unwrap_or(1))
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("{} added to cart", product.name),
        "cart": CartView::build(&cart, &PromoState::none()),
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Set a line's quantity; zero or less removes the line.
#[instrument(skip(state, session, user))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    user: OptionalIdentity,
    Json(form): Json<UpdateForm>,
) -> impl IntoResponse {
    let cart = engine(&state, session, user)
        .update_quantity(form.product_id, form.quantity)
        .await;

    Json(json!({
        "success": true,
        "cart": CartView::build(&cart, &PromoState::none()),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub product_id: ProductId,
}

/// Remove a line from the session cart.
#[instrument(skip(state, session, user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    user: OptionalIdentity,
    Json(form): Json<RemoveForm>,
) -> impl IntoResponse {
    let cart = engine(&state, session, user).remove(form.product_id).await;

    Json(json!({
        "success": true,
        "message": "Item removed",
        "cart": CartView::build(&cart, &PromoState::none()),
    }))
}

/// Cart count badge.
#[instrument(skip(state, session, user))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    user: OptionalIdentity,
) -> impl IntoResponse {
    let cart = engine(&state, session, user).load().await;
    Json(json!({ "success": true, "count": cart.count() }))
}

#[derive(Debug, Deserialize)]
pub struct PromoForm {
    pub code: String,
}

/// Validate a promo code against the current cart.
///
/// An unknown code is UI-level feedback, not an error status: the response
/// reports failure and totals without a discount.
#[instrument(skip(state, session, user))]
pub async fn apply_promo(
    State(state): State<AppState>,
    session: Session,
    user: OptionalIdentity,
    Json(form): Json<PromoForm>,
) -> impl IntoResponse {
    let cart = engine(&state, session, user).load().await;

    match PromoState::parse(&form.code) {
        Ok(promo) => Json(json!({
            "success": true,
            "message": "Promo applied: 10% off",
            "discount_fraction": promo.discount_fraction,
            "cart": CartView::build(&cart, &promo),
        })),
        Err(e) => {
            tracing::debug!(error = %e, "Promo code rejected");
            Json(json!({
                "success": false,
                "message": "Invalid promo code",
                "discount_fraction": Decimal::ZERO,
                "cart": CartView::build(&cart, &PromoState::none()),
            }))
        }
    }
}

/// Login-time cart reconciliation.
///
/// Policy: a non-empty server cart overwrites the session cart; an empty one
/// is seeded from the session. A failed exchange is a sync failure - logged,
/// swallowed, and the session cart stays authoritative locally.
#[instrument(skip(state, session, user))]
pub async fn sync(
    State(state): State<AppState>,
    session: Session,
    RequireIdentity(user): RequireIdentity,
) -> impl IntoResponse {
    let engine = CartEngine::new(session, Some(user.clone()), state.sync().clone());
    let local = engine.load().await;

    let adopted = match state.sync().reconcile_login(&user, local.clone()).await {
        Ok(adopted) => engine.replace(adopted).await,
        Err(e) => {
            tracing::error!(user_id = %user, error = %e, "Login cart reconciliation failed");
            local
        }
    };

    Json(json!({
        "success": true,
        "cart": CartView::build(&adopted, &PromoState::none()),
    }))
}

// =============================================================================
// Server-held Cart Document
// =============================================================================

/// The authenticated user's server-held cart document.
#[instrument(skip(state, user))]
pub async fn get_document(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
) -> Result<impl IntoResponse> {
    let cart = CartRepository::new(state.pool()).get(&user).await?;

    Ok(Json(json!({ "success": true, "cart": cart })))
}

/// Replace the user's cart document with a full snapshot.
///
/// Last write wins; there is no field-level merge. Concurrent multi-device
/// editing can clobber one device's changes - a known limitation, since one
/// active client session is assumed.
#[instrument(skip(state, user, cart))]
pub async fn replace_document(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Json(mut cart): Json<Cart>,
) -> Result<impl IntoResponse> {
    cart.retain_valid();
    CartRepository::new(state.pool()).replace(&user, &cart).await?;

    Ok(Json(json!({ "success": true, "message": "Cart updated" })))
}

/// Delete the user's cart document (explicit logout cleanup).
#[instrument(skip(state, user))]
pub async fn clear_document(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
) -> Result<impl IntoResponse> {
    CartRepository::new(state.pool()).clear(&user).await?;

    Ok(Json(json!({ "success": true, "message": "Cart cleared" })))
}
