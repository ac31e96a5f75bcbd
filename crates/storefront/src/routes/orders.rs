//! Order route handlers.

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::{OptionalIdentity, RequireIdentity};
use crate::services::{CartEngine, OrderBuilder};
use crate::services::orders::CreateOrderRequest;
use crate::state::AppState;

/// Checkout: convert the submitted cart into a persisted order.
///
/// The whole operation either fully succeeds (order persisted, cart cleared)
/// or fully fails (no partial order, cart untouched). The session cart is
/// only reset after the transaction commits.
#[instrument(skip(state, session, user, request))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    OptionalIdentity(user): OptionalIdentity,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse> {
    let order = OrderBuilder::new(state.pool())
        .create_order(state.catalog(), user.clone(), request)
        .await?;

    // Order committed and server cart cleared; reset the session copy too.
    CartEngine::new(session, user, state.sync().clone())
        .clear_local()
        .await;

    Ok(Json(json!({
        "success": true,
        "message": "Order placed successfully",
        "order": order,
    })))
}

/// The authenticated user's order history, most recent first.
#[instrument(skip(state, user))]
pub async fn list(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool()).list(&user).await?;

    Ok(Json(json!({ "success": true, "orders": orders })))
}
