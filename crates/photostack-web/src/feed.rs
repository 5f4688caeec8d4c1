//! Photo list fetching.

use async_trait::async_trait;
use photostack_core::PhotoRecord;
use tracing::debug;

use crate::error::WebError;

/// Where the carousel gets its photos from.
#[async_trait]
pub trait PhotoFeed: Send + Sync {
    /// Fetch the photo list once.
    async fn fetch(&self) -> Result<Vec<PhotoRecord>, WebError>;
}

/// Fetches `GET {api_base}getAllPhotos` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPhotoFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpPhotoFeed {
    /// Fetch from `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Fetch from `url` with an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// The URL being fetched.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PhotoFeed for HttpPhotoFeed {
    async fn fetch(&self) -> Result<Vec<PhotoRecord>, WebError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WebError::Network(format!("{} returned {status}", self.url)));
        }
        let body = response.bytes().await?;
        let records: Vec<PhotoRecord> = serde_json::from_slice(&body)?;
        debug!(url = %self.url, count = records.len(), "fetched photo list");
        Ok(records)
    }
}
