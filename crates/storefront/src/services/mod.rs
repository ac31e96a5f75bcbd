//! External service clients and the cart/order application services.

pub mod cart;
pub mod identity;
pub mod images;
pub mod orders;
pub mod sync;

pub use cart::CartEngine;
pub use identity::IdentityClient;
pub use images::ImageHostClient;
pub use orders::OrderBuilder;
pub use sync::CartSyncGateway;
