//! Storage seam of the listing function.

use async_trait::async_trait;

use crate::error::SourceError;

/// Where photos are listed from and how they are addressed.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Every object key in `bucket`, in storage listing order.
    ///
    /// Implementations follow pagination until exhausted.
    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, SourceError>;

    /// An absolute URL a browser can fetch the object from.
    async fn object_url(&self, bucket: &str, key: &str) -> Result<String, SourceError>;
}
