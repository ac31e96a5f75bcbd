//! The order builder.
//!
//! The only operation that durably commits a cart to history. Prices are
//! re-resolved from the catalog server-side ("authoritative re-pricing");
//! anything the client declared is advisory input, used only as a fallback
//! when the catalog lookup fails. Persistence and cart-document clearing run
//! in one transaction, so a failure leaves no partial order and an intact
//! cart for retry.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use swiftcart_core::pricing::{PromoState, Totals, quote_subtotal};
use swiftcart_core::round2;
use swiftcart_core::{AddressId, OrderId, OrderStatus, ProductId, UserId};

use crate::catalog::Catalog;
use crate::db::{AddressRepository, OrderRepository, RepositoryError};
use crate::models::{NewOrder, Order, OrderItem};

/// Name stored when neither the catalog nor the client can supply one.
const FALLBACK_PRODUCT_NAME: &str = "Unknown Product";

/// The only payment method this storefront records.
const PAYMENT_METHOD: &str = "COD";

/// Errors that block order creation.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No authenticated user; checkout is blocked.
    #[error("user not authenticated")]
    Unauthenticated,

    /// No delivery address was selected (or it does not belong to the user).
    #[error("no delivery address selected")]
    MissingAddress,

    /// The submitted item list is empty or malformed.
    #[error("invalid order input: {0}")]
    InvalidInput(String),

    /// Persistence failed; no order was created and the cart is unchanged.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One item as submitted by the client at checkout.
///
/// `name`/`price` are advisory; they only matter when the catalog cannot
/// resolve the product.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// Checkout request body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<SubmittedItem>,
    #[serde(default)]
    pub address_id: Option<AddressId>,
    /// Re-validated server-side; an unknown code simply yields no discount.
    #[serde(default)]
    pub promo_code: Option<String>,
    /// Advisory only; the server-computed total is what gets stored.
    #[serde(default)]
    pub declared_total: Option<Decimal>,
}

/// Builds and persists orders.
pub struct OrderBuilder<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderBuilder<'a> {
    /// Create a new order builder.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Convert a checkout request into a persisted order.
    ///
    /// On success the user's server-held cart document has been cleared in
    /// the same transaction; the caller still owns clearing the session cart.
    ///
    /// # Errors
    ///
    /// - [`OrderError::Unauthenticated`] without a user
    /// - [`OrderError::InvalidInput`] for an empty item list
    /// - [`OrderError::MissingAddress`] without a usable address
    /// - [`OrderError::Repository`] if persistence fails (nothing committed)
    #[instrument(skip(self, catalog, user, request))]
    pub async fn create_order<C: Catalog>(
        &self,
        catalog: &C,
        user: Option<UserId>,
        request: CreateOrderRequest,
    ) -> Result<Order, OrderError> {
        let (user_id, address_id) = validate(user, &request)?;

        let address = AddressRepository::new(self.pool)
            .get(&user_id, address_id)
            .await?
            .ok_or(OrderError::MissingAddress)?;

        let items = resolve_items(catalog, &request.items).await;
        let promo = revalidate_promo(request.promo_code.as_deref());
        let totals = order_totals(&items, &promo);

        if let Some(declared) = request.declared_total
            && round2(declared) != totals.total
        {
            // Tolerated: the storefront is not payment-authoritative, but the
            // discrepancy is worth a trace.
            tracing::info!(
                declared = %declared,
                computed = %totals.total,
                "Client-declared total differs from server-computed total"
            );
        }

        let order = OrderRepository::new(self.pool)
            .create_and_clear_cart(NewOrder {
                id: OrderId::generate(),
                user_id,
                items,
                totals,
                address: (&address).into(),
                payment_method: PAYMENT_METHOD.to_owned(),
                status: OrderStatus::Pending,
            })
            .await?;

        tracing::info!(order_id = %order.id, "Order placed");
        Ok(order)
    }
}

/// Input checks that must pass before any database work.
fn validate(
    user: Option<UserId>,
    request: &CreateOrderRequest,
) -> Result<(UserId, AddressId), OrderError> {
    let user_id = user.ok_or(OrderError::Unauthenticated)?;
    if request.items.is_empty() {
        return Err(OrderError::InvalidInput("cart is empty".to_owned()));
    }
    let address_id = request.address_id.ok_or(OrderError::MissingAddress)?;
    Ok((user_id, address_id))
}

/// Re-resolve every submitted item against the catalog.
///
/// Catalog hits use authoritative name/price; misses and lookup errors fall
/// back to client-declared values (else placeholders) so order creation stays
/// resilient to transient catalog issues. Fallbacks are logged as
/// data-quality events. Submission order is preserved.
async fn resolve_items<C: Catalog>(catalog: &C, submitted: &[SubmittedItem]) -> Vec<OrderItem> {
    let mut items = Vec::with_capacity(submitted.len());

    for item in submitted {
        let quantity = item
            .quantity
            .filter(|q| *q > 0)
            .and_then(|q| u32::try_from(q).ok())
            .unwrap_or(1);

        let (name, price) = match catalog.find_product(item.product_id).await {
            Ok(Some(product)) => {
                let price = product.unit_price();
                (product.name, price)
            }
            Ok(None) => {
                tracing::warn!(
                    product_id = %item.product_id,
                    "Product not in catalog at checkout; using client-declared values"
                );
                fallback_fields(item)
            }
            Err(e) => {
                tracing::warn!(
                    product_id = %item.product_id,
                    error = %e,
                    "Catalog lookup failed at checkout; using client-declared values"
                );
                fallback_fields(item)
            }
        };

        let price = round2(price.max(Decimal::ZERO));
        items.push(OrderItem {
            product_id: item.product_id,
            name,
            price,
            quantity,
            line_total: price * Decimal::from(quantity),
        });
    }

    items
}

/// Client-declared name/price, else deterministic placeholders.
fn fallback_fields(item: &SubmittedItem) -> (String, Decimal) {
    let name = item
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_PRODUCT_NAME.to_owned());
    let price = item.price.unwrap_or(Decimal::ZERO);
    (name, price)
}

/// Re-derive the discount server-side; an unknown code is no discount.
fn revalidate_promo(code: Option<&str>) -> PromoState {
    code.map_or_else(PromoState::none, |code| {
        PromoState::parse(code).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Promo code rejected at checkout");
            PromoState::none()
        })
    })
}

/// Totals over authoritatively re-priced lines, rounded once for the record.
fn order_totals(items: &[OrderItem], promo: &PromoState) -> Totals {
    let subtotal: Decimal = items.iter().map(|item| item.line_total).sum();
    quote_subtotal(subtotal, promo).rounded()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::catalog::CatalogError;
    use crate::models::CatalogProduct;

    struct StubCatalog {
        products: HashMap<ProductId, CatalogProduct>,
        failing: bool,
    }

    impl StubCatalog {
        fn with(products: Vec<CatalogProduct>) -> Self {
            Self {
                products: products.into_iter().map(|p| (p.id, p)).collect(),
                failing: false,
            }
        }

        fn failing() -> Self {
            Self {
                products: HashMap::new(),
                failing: true,
            }
        }
    }

    impl Catalog for StubCatalog {
        async fn find_product(
            &self,
            id: ProductId,
        ) -> Result<Option<CatalogProduct>, CatalogError> {
            if self.failing {
                return Err(CatalogError::Lookup(RepositoryError::NotFound));
            }
            Ok(self.products.get(&id).cloned())
        }
    }

    fn catalog_product(id: ProductId, price: i64, offer: Option<i64>) -> CatalogProduct {
        CatalogProduct {
            id,
            name: "Catalog Widget".to_owned(),
            price: Decimal::new(price, 0),
            offer_price: offer.map(|o| Decimal::new(o, 0)),
            image_url: None,
        }
    }

    fn submitted(id: ProductId, quantity: Option<i64>) -> SubmittedItem {
        SubmittedItem {
            product_id: id,
            quantity,
            name: Some("Client Widget".to_owned()),
            price: Some(Decimal::new(1, 0)),
        }
    }

    #[tokio::test]
    async fn test_resolve_uses_catalog_over_declared() {
        let id = ProductId::generate();
        let catalog = StubCatalog::with(vec![catalog_product(id, 100, Some(80))]);

        let items = resolve_items(&catalog, &[submitted(id, Some(2))]).await;

        assert_eq!(items.len(), 1);
        let item = items.first().unwrap();
        assert_eq!(item.name, "Catalog Widget");
        assert_eq!(item.price, Decimal::new(80, 0));
        assert_eq!(item.quantity, 2);
        assert_eq!(item.line_total, Decimal::new(160, 0));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_catalog_miss() {
        let id = ProductId::generate();
        let catalog = StubCatalog::with(vec![]);

        let items = resolve_items(&catalog, &[submitted(id, Some(3))]).await;

        let item = items.first().unwrap();
        assert_eq!(item.name, "Client Widget");
        assert_eq!(item.price, Decimal::new(1, 0));
        assert_eq!(item.line_total, Decimal::new(3, 0));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_lookup_error() {
        let id = ProductId::generate();
        let catalog = StubCatalog::failing();

        let items = resolve_items(&catalog, &[submitted(id, Some(1))]).await;

        let item = items.first().unwrap();
        assert_eq!(item.name, "Client Widget");
        assert_eq!(item.price, Decimal::new(1, 0));
    }

    #[tokio::test]
    async fn test_resolve_uses_placeholders_without_declared_fields() {
        let id = ProductId::generate();
        let catalog = StubCatalog::with(vec![]);
        let bare = SubmittedItem {
            product_id: id,
            quantity: None,
            name: None,
            price: None,
        };

        let items = resolve_items(&catalog, &[bare]).await;

        let item = items.first().unwrap();
        assert_eq!(item.name, FALLBACK_PRODUCT_NAME);
        assert_eq!(item.price, Decimal::ZERO);
        assert_eq!(item.quantity, 1);
    }

    #[tokio::test]
    async fn test_resolve_defaults_nonpositive_quantity_to_one() {
        let id = ProductId::generate();
        let catalog = StubCatalog::with(vec![catalog_product(id, 10, None)]);

        let items = resolve_items(&catalog, &[submitted(id, Some(-4))]).await;

        assert_eq!(items.first().unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_resolve_preserves_submission_order() {
        let first = ProductId::generate();
        let second = ProductId::generate();
        let catalog = StubCatalog::with(vec![
            catalog_product(first, 10, None),
            catalog_product(second, 20, None),
        ]);

        let items = resolve_items(
            &catalog,
            &[submitted(first, Some(1)), submitted(second, Some(1))],
        )
        .await;

        let ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_validate_requires_user() {
        let request = CreateOrderRequest {
            items: vec![submitted(ProductId::generate(), Some(1))],
            address_id: Some(AddressId::generate()),
            promo_code: None,
            declared_total: None,
        };

        let err = validate(None, &request).unwrap_err();
        assert!(matches!(err, OrderError::Unauthenticated));
    }

    #[test]
    fn test_validate_rejects_empty_items() {
        let request = CreateOrderRequest {
            items: vec![],
            address_id: Some(AddressId::generate()),
            promo_code: None,
            declared_total: None,
        };

        let err = validate(UserId::new("user_1"), &request).unwrap_err();
        assert!(matches!(err, OrderError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_requires_address() {
        let request = CreateOrderRequest {
            items: vec![submitted(ProductId::generate(), Some(1))],
            address_id: None,
            promo_code: None,
            declared_total: None,
        };

        let err = validate(UserId::new("user_1"), &request).unwrap_err();
        assert!(matches!(err, OrderError::MissingAddress));
    }

    #[test]
    fn test_order_totals_match_pricing_formula() {
        let items = vec![OrderItem {
            product_id: ProductId::generate(),
            name: "P1".to_owned(),
            price: Decimal::new(100, 0),
            quantity: 2,
            line_total: Decimal::new(200, 0),
        }];

        let totals = order_totals(&items, &PromoState::none());
        assert_eq!(totals.subtotal, Decimal::new(200, 0));
        assert_eq!(totals.tax, Decimal::new(4, 0));
        assert_eq!(totals.total, Decimal::new(204, 0));
    }

    #[test]
    fn test_revalidate_promo_accepts_known_code_only() {
        assert_eq!(
            revalidate_promo(Some("SAVE10")).discount_fraction,
            Decimal::new(10, 2)
        );
        assert_eq!(revalidate_promo(Some("save99")).discount_fraction, Decimal::ZERO);
        assert_eq!(revalidate_promo(None).discount_fraction, Decimal::ZERO);
    }
}
