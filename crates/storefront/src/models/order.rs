//! Order domain types.
//!
//! An order is an immutable historical record created exactly once per
//! successful checkout. Money fields are rounded to two decimal places when
//! the record is built; it is never recomputed afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use swiftcart_core::pricing::Totals;
use swiftcart_core::{OrderId, OrderStatus, ProductId, UserId};

use super::address::AddressSnapshot;

/// One line of an order.
///
/// `price` is the server's authoritative catalog price at order-creation
/// time, never the price the client declared (the declared price is only a
/// fallback when the catalog lookup fails).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// A persisted order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Insertion-ordered; the sequence is fixed at creation.
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub address: AddressSnapshot,
    /// Payment-method label only; no payment processing happens here.
    pub payment_method: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// An order ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub totals: Totals,
    pub address: AddressSnapshot,
    pub payment_method: String,
    pub status: OrderStatus,
}
