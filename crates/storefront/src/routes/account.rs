//! Account data route handlers.

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use tracing::instrument;

use crate::db::{AddressRepository, CartRepository};
use crate::error::Result;
use crate::middleware::RequireIdentity;
use crate::state::AppState;

/// The authenticated user's storefront data: server-held cart and addresses.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
) -> Result<impl IntoResponse> {
    let cart = CartRepository::new(state.pool()).get(&user).await?;
    let addresses = AddressRepository::new(state.pool()).list(&user).await?;

    Ok(Json(json!({
        "success": true,
        "user": {
            "id": user,
            "cart_items": cart,
            "addresses": addresses,
        },
    })))
}
