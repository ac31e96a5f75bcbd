//! Hosted image service client.
//!
//! Product images are never stored locally: binary uploads pass through to
//! the hosted service, which returns durable URLs. The catalog stores only
//! those URLs.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::ImageHostConfig;

/// Upload timeout. Generous because sellers upload multi-megabyte photos.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when uploading images.
#[derive(Debug, Error)]
pub enum ImageHostError {
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

/// Image host API client.
#[derive(Clone)]
pub struct ImageHostClient {
    inner: Arc<ImageHostClientInner>,
}

struct ImageHostClientInner {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl ImageHostClient {
    /// Create a new image host client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ImageHostConfig) -> Result<Self, ImageHostError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| ImageHostError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(UPLOAD_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(ImageHostClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Upload one image and return its durable URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails or the response is malformed.
    #[instrument(skip(self, bytes), fields(file_name = %file_name, size = bytes.len()))]
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ImageHostError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| ImageHostError::Parse(format!("Invalid content type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{}/v1/upload", self.inner.base_url);
        let response = self.inner.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ImageHostError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ImageHostError::Parse(e.to_string()))?;

        Ok(body.secure_url)
    }
}
