//! Identity provider API client.
//!
//! The storefront delegates all authentication to an external provider and
//! only ever sees opaque user identifiers. This client verifies bearer
//! tokens and answers the seller capability lookup; it is treated as a black
//! box with a bounded request timeout.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use swiftcart_core::UserId;

use crate::config::IdentityConfig;

/// Request timeout for identity provider calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a verified token is remembered before re-verification.
const VERIFY_CACHE_TTL: Duration = Duration::from_secs(60);

/// Errors that can occur when talking to the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build the client or parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Identity provider API client.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    base_url: String,
    // Verified tokens are cached briefly so every request in a burst does not
    // round-trip to the provider.
    verified: Cache<String, Option<UserId>>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct UserMetadata {
    #[serde(default)]
    is_seller: Option<bool>,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(default)]
    public_metadata: Option<UserMetadata>,
}

impl IdentityClient {
    /// Create a new identity provider client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| IdentityError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let verified = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(VERIFY_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(IdentityClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                verified,
            }),
        })
    }

    /// Verify a session bearer token.
    ///
    /// Returns the opaque user identifier the provider issued, or `None` for
    /// an invalid/expired token.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable or responds with an
    /// unexpected status.
    #[instrument(skip(self, token))]
    pub async fn verify_token(&self, token: &str) -> Result<Option<UserId>, IdentityError> {
        if let Some(cached) = self.inner.verified.get(token).await {
            return Ok(cached);
        }

        let url = format!("{}/v1/sessions/verify", self.inner.base_url);
        let response = self
            .inner
            .client
            .post(&url)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await?;

        let status = response.status();

        // The provider signals a bad token with 401/404, not an error payload
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            self.inner.verified.insert(token.to_string(), None).await;
            return Ok(None);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        let user = body.user_id.and_then(UserId::new);
        self.inner
            .verified
            .insert(token.to_string(), user.clone())
            .await;

        Ok(user)
    }

    /// Seller capability lookup.
    ///
    /// A user is a seller when the provider's user metadata says so, either
    /// via the `is_seller` flag or a `seller` role. Unknown users are not
    /// sellers.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable or responds with an
    /// unexpected status.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn is_seller(&self, user_id: &UserId) -> Result<bool, IdentityError> {
        let url = format!("{}/v1/users/{}", self.inner.base_url, user_id);
        let response = self.inner.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: UserResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        let metadata = body.public_metadata.unwrap_or_default();
        Ok(metadata.is_seller == Some(true) || metadata.role.as_deref() == Some("seller"))
    }
}
