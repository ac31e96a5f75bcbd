//! Address domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use swiftcart_core::{AddressId, UserId};

/// A user's shipping address.
///
/// Addresses have a lifecycle independent from carts: created via the address
/// management flow, referenced by ID at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub full_name: String,
    /// Street / area line.
    pub area: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// Address fields accepted from clients when creating an address.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAddress {
    pub full_name: String,
    pub area: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
}

/// The copy of an address embedded in an order.
///
/// A snapshot, not a reference: the user may edit or delete the address after
/// placing the order, and the order must stay historically accurate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSnapshot {
    pub full_name: String,
    pub area: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
}

impl From<&Address> for AddressSnapshot {
    fn from(address: &Address) -> Self {
        Self {
            full_name: address.full_name.clone(),
            area: address.area.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            postal_code: address.postal_code.clone(),
            phone: address.phone.clone(),
        }
    }
}
