//! S3-backed photo source used by the deployed function.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use tracing::debug;

use crate::error::SourceError;
use crate::source::PhotoSource;

/// Lists with `ListObjectsV2` and addresses objects with presigned `GetObject`
/// URLs.
#[derive(Debug, Clone)]
pub struct S3PhotoSource {
    client: aws_sdk_s3::Client,
    expires_in: Duration,
}

impl S3PhotoSource {
    /// Wrap a client; presigned URLs stay valid for `expires_in`.
    #[must_use]
    pub fn new(client: aws_sdk_s3::Client, expires_in: Duration) -> Self {
        Self { client, expires_in }
    }

    /// Build a client from the ambient AWS configuration.
    pub async fn from_env(expires_in: Duration) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_s3::Client::new(&config), expires_in)
    }
}

#[async_trait]
impl PhotoSource for S3PhotoSource {
    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, SourceError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                SourceError::new(format!("failed to list bucket {bucket}: {e}"))
            })?;
            keys.extend(page.contents().iter().filter_map(|o| o.key().map(ToOwned::to_owned)));
        }
        debug!(bucket, count = keys.len(), "listed bucket");
        Ok(keys)
    }

    async fn object_url(&self, bucket: &str, key: &str) -> Result<String, SourceError> {
        let presigning = PresigningConfig::expires_in(self.expires_in)
            .map_err(|e| SourceError::new(format!("invalid presigning config: {e}")))?;
        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| SourceError::new(format!("failed to presign {key}: {e}")))?;
        Ok(request.uri().to_owned())
    }
}
