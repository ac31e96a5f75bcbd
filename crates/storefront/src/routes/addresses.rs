//! Address route handlers.
//!
//! Addresses have their own lifecycle, independent of carts: created here,
//! referenced by ID at checkout, snapshotted into orders.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use tracing::instrument;

use swiftcart_core::AddressId;

use crate::db::AddressRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireIdentity;
use crate::models::NewAddress;
use crate::state::AppState;

/// The authenticated user's addresses.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
) -> Result<impl IntoResponse> {
    let addresses = AddressRepository::new(state.pool()).list(&user).await?;

    Ok(Json(json!({ "success": true, "addresses": addresses })))
}

/// Add a new address.
#[instrument(skip(state, user, address))]
pub async fn create(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Json(address): Json<NewAddress>,
) -> Result<impl IntoResponse> {
    if address.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("Address data is missing".to_owned()));
    }

    let address = AddressRepository::new(state.pool())
        .create(&user, address)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Address added successfully",
        "address": address,
    })))
}

/// Delete an address.
///
/// Orders keep their own snapshot, so this never rewrites order history.
#[instrument(skip(state, user))]
pub async fn delete(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Path(id): Path<AddressId>,
) -> Result<impl IntoResponse> {
    let deleted = AddressRepository::new(state.pool()).delete(&user, id).await?;

    if deleted {
        Ok(Json(json!({ "success": true, "message": "Address removed" })))
    } else {
        Err(AppError::NotFound(format!("Address not found: {id}")))
    }
}
