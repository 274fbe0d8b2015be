//! HTTP object store implementation.
//!
//! Talks to any endpoint that serves objects at `{base_url}/{key}` with
//! GET, PUT, HEAD and DELETE (S3-compatible gateways, WebDAV shares, CDN
//! origins with write access).

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::debug;

use super::config::HttpStorageConfig;
use super::error::StorageError;
use super::traits::{validate_key, ObjectStore};

/// Object store reached over HTTP.
pub struct HttpObjectStore {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(config: HttpStorageConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StorageError::Unavailable(format!("failed to build client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token.filter(|t| !t.is_empty()),
        })
    }

    /// Builds the object URL, percent-encoding each key segment.
    fn object_url(&self, key: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        let encoded = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Ok(format!("{}/{}", self.base_url, encoded))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, key: &str) -> Result<Bytes, StorageError> {
        let url = self.object_url(key)?;
        let response = self.authorize(self.client.get(&url)).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response.bytes().await?),
            StatusCode::NOT_FOUND => Err(StorageError::not_found(key)),
            status => Err(StorageError::Unavailable(format!(
                "GET {} returned {}",
                url, status
            ))),
        }
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        let url = self.object_url(key)?;
        let size = data.len();
        let response = self
            .authorize(self.client.put(&url))
            .header(header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::write_failed(key, e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::write_failed(
                key,
                format!("PUT returned {}", response.status()),
            ));
        }

        debug!(key, content_type, bytes = size, "Uploaded object");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let url = self.object_url(key)?;
        let response = self.authorize(self.client.head(&url)).send().await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(StorageError::Unavailable(format!(
                "HEAD {} returned {}",
                url, status
            ))),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let url = self.object_url(key)?;
        let response = self.authorize(self.client.delete(&url)).send().await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            status => Err(StorageError::Unavailable(format!(
                "DELETE {} returned {}",
                url, status
            ))),
        }
    }
}
