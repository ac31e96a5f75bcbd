//! Identity extractors.
//!
//! Authentication is fully delegated to the external identity provider: a
//! request carries a bearer token, the provider answers with an opaque user
//! identifier or nothing. These extractors are the only place that exchange
//! happens.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use swiftcart_core::UserId;

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireIdentity(user_id): RequireIdentity,
/// ) -> impl IntoResponse {
///     format!("Hello, {user_id}!")
/// }
/// ```
pub struct RequireIdentity(pub UserId);

impl FromRequestParts<AppState> for RequireIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;

        let user = state.identity().verify_token(token).await?;

        user.map(Self)
            .ok_or_else(|| AppError::Unauthorized("invalid or expired token".to_owned()))
    }
}

/// Extractor that optionally resolves the current user.
///
/// Unlike `RequireIdentity`, this never rejects the request: the cart must
/// keep working for unauthenticated visitors, and a provider outage degrades
/// to "not logged in" rather than an error.
pub struct OptionalIdentity(pub Option<UserId>);

impl FromRequestParts<AppState> for OptionalIdentity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };

        let user = match state.identity().verify_token(token).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Identity verification failed; treating as anonymous");
                None
            }
        };

        Ok(Self(user))
    }
}

/// Pull the bearer token out of the Authorization header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
