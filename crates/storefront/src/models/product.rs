//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use swiftcart_core::{ProductId, UserId};
use swiftcart_core::cart::ProductSnapshot;

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// The seller who listed the product.
    pub seller_id: UserId,
    pub name: String,
    pub description: String,
    pub category: String,
    /// List price.
    pub price: Decimal,
    /// Discounted price, if any. Normalized at the repository boundary:
    /// negative or missing values become `None`.
    pub offer_price: Option<Decimal>,
    /// Durable URLs returned by the image host.
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to list a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: UserId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub offer_price: Option<Decimal>,
    pub image_urls: Vec<String>,
}

/// The canonical product shape the cart and order core consume.
///
/// This is the one record shape produced at the Catalog Store boundary; any
/// drift in stored field shapes is resolved before this point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub offer_price: Option<Decimal>,
    pub image_url: Option<String>,
}

impl CatalogProduct {
    /// The price a unit is charged at: offer price when present, else list
    /// price. Matches the cart's effective-price rule so client display and
    /// server order persistence agree.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.offer_price.unwrap_or(self.price)
    }

    /// The snapshot captured into a cart line.
    #[must_use]
    pub fn to_snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: Some(self.id),
            name: self.name.clone(),
            price: self.price,
            offer_price: self.offer_price,
            image_url: self.image_url.clone(),
        }
    }
}

impl From<&Product> for CatalogProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            offer_price: product.offer_price,
            image_url: product.image_urls.first().cloned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_price_prefers_offer() {
        let product = CatalogProduct {
            id: ProductId::generate(),
            name: "Widget".to_owned(),
            price: Decimal::new(100, 0),
            offer_price: Some(Decimal::new(80, 0)),
            image_url: None,
        };
        assert_eq!(product.unit_price(), Decimal::new(80, 0));
    }

    #[test]
    fn test_unit_price_falls_back_to_list() {
        let product = CatalogProduct {
            id: ProductId::generate(),
            name: "Widget".to_owned(),
            price: Decimal::new(100, 0),
            offer_price: None,
            image_url: None,
        };
        assert_eq!(product.unit_price(), Decimal::new(100, 0));
    }
}
