//! Request middleware: identity extraction and session management.

pub mod auth;
pub mod session;

pub use auth::{OptionalIdentity, RequireIdentity};
pub use session::create_session_layer;
