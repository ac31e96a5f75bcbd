//! Order repository.
//!
//! Orders are written exactly once, inside a transaction that also clears the
//! user's cart document: either both happen or neither does.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use swiftcart_core::{OrderId, OrderStatus, UserId};

use super::RepositoryError;
use crate::models::{AddressSnapshot, NewOrder, Order, OrderItem};

/// Repository for order records.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: String,
    items: Json<Vec<OrderItem>>,
    subtotal: Decimal,
    tax: Decimal,
    discount: Decimal,
    total: Decimal,
    address: Json<AddressSnapshot>,
    payment_method: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let user_id = UserId::new(row.user_id).ok_or_else(|| {
            RepositoryError::DataCorruption("empty user id on order".to_owned())
        })?;
        let status: OrderStatus = row.status.parse().map_err(|e: String| {
            RepositoryError::DataCorruption(format!("invalid order status: {e}"))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id,
            items: row.items.0,
            subtotal: row.subtotal,
            tax: row.tax,
            discount: row.discount,
            total: row.total,
            address: row.address.0,
            payment_method: row.payment_method,
            status,
            created_at: row.created_at,
        })
    }
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist an order and clear the user's cart document atomically.
    ///
    /// Runs in one transaction so a persistence failure leaves both the order
    /// table and the cart document untouched; the caller can retry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn create_and_clear_cart(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO storefront.orders
                (id, user_id, items, subtotal, tax, discount, total,
                 address, payment_method, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, user_id, items, subtotal, tax, discount, total,
                      address, payment_method, status, created_at
            ",
        )
        .bind(order.id)
        .bind(&order.user_id)
        .bind(Json(&order.items))
        .bind(order.totals.subtotal)
        .bind(order.totals.tax)
        .bind(order.totals.discount)
        .bind(order.totals.total)
        .bind(Json(&order.address))
        .bind(&order.payment_method)
        .bind(order.status.to_string())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM storefront.cart WHERE user_id = $1")
            .bind(&order.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// List a user's orders, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored order is invalid.
    pub async fn list(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, items, subtotal, tax, discount, total,
                   address, payment_method, status, created_at
            FROM storefront.orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }
}
