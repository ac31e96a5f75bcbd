//! Product route handlers.
//!
//! Public listing/detail plus the seller management surface. Seller
//! authorization is a capability lookup against the identity provider;
//! image binaries pass straight through to the image host and only the
//! returned URLs are stored.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::instrument;

use swiftcart_core::{ProductId, UserId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireIdentity;
use crate::models::NewProduct;
use crate::state::AppState;

/// Public product listing, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let products = ProductRepository::new(state.pool()).list().await?;

    Ok(Json(json!({ "success": true, "products": products })))
}

/// Public product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = ProductRepository::new(state.pool())
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product not found: {id}")))?;

    Ok(Json(json!({ "success": true, "product": product })))
}

/// The authenticated seller's own listings, newest first.
#[instrument(skip(state, user))]
pub async fn seller_index(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
) -> Result<impl IntoResponse> {
    ensure_seller(&state, &user).await?;

    let products = ProductRepository::new(state.pool())
        .list_by_seller(&user)
        .await?;

    Ok(Json(json!({ "success": true, "products": products })))
}

/// List a new product (seller only).
///
/// Multipart form: `name`, `description`, `category`, `price`,
/// `offer_price` (optional) and one or more `images` files. Each image is
/// uploaded to the image host before the product row is written.
#[instrument(skip(state, user, multipart))]
pub async fn create(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    ensure_seller(&state, &user).await?;

    let mut name = None;
    let mut description = None;
    let mut category = None;
    let mut price = None;
    let mut offer_price = None;
    let mut image_urls = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed form data: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_owned();
        match field_name.as_str() {
            "name" => name = Some(text_field(field).await?),
            "description" => description = Some(text_field(field).await?),
            "category" => category = Some(text_field(field).await?),
            "price" => price = Some(decimal_field(field, "price").await?),
            "offer_price" => {
                let value = text_field(field).await?;
                if !value.is_empty() {
                    offer_price = Some(parse_decimal(&value, "offer_price")?);
                }
            }
            "images" => {
                let file_name = field.file_name().unwrap_or("image").to_owned();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Malformed image upload: {e}")))?;

                let url = state
                    .images()
                    .upload(&file_name, &content_type, bytes.to_vec())
                    .await?;
                image_urls.push(url);
            }
            // Unknown fields are ignored
            _ => {}
        }
    }

    let name = required(name, "name")?;
    let description = required(description, "description")?;
    let category = required(category, "category")?;
    let price = price.ok_or_else(|| AppError::BadRequest("Missing field: price".to_owned()))?;
    if image_urls.is_empty() {
        return Err(AppError::BadRequest("No image files uploaded".to_owned()));
    }

    let product = ProductRepository::new(state.pool())
        .create(NewProduct {
            seller_id: user,
            name,
            description,
            category,
            price: price.max(Decimal::ZERO),
            offer_price: offer_price.filter(|p| *p >= Decimal::ZERO),
            image_urls,
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Product uploaded successfully!",
        "product": product,
    })))
}

/// Capability check against the identity provider.
async fn ensure_seller(state: &AppState, user: &UserId) -> Result<()> {
    if state.identity().is_seller(user).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "User not authorized as seller".to_owned(),
        ))
    }
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    let name = field.name().unwrap_or_default().to_owned();
    field
        .text()
        .await
        .map(|value| value.trim().to_owned())
        .map_err(|e| AppError::BadRequest(format!("Malformed field {name}: {e}")))
}

async fn decimal_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<Decimal> {
    let value = text_field(field).await?;
    parse_decimal(&value, name)
}

fn parse_decimal(value: &str, name: &str) -> Result<Decimal> {
    value
        .parse::<Decimal>()
        .map_err(|e| AppError::BadRequest(format!("Invalid {name}: {e}")))
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing field: {name}")))
}
