//! Bucket state.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::keystore::KeyStore;

/// Server-side encryption applied to objects at rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encryption {
    /// No server-side encryption.
    #[default]
    None,
    /// SSE-S3 (`AES256`) with service-managed keys.
    Aes256,
}

impl Encryption {
    /// The `x-amz-server-side-encryption` header value, if any.
    #[must_use]
    pub fn header_value(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Aes256 => Some("AES256"),
        }
    }
}

/// Creation-time settings for a bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketSettings {
    /// Retain every write as a new version.
    pub versioned: bool,
    /// Encryption recorded on every object.
    pub encryption: Encryption,
}

/// A bucket and its objects.
pub struct Bucket {
    /// Physical bucket name.
    pub name: String,
    /// Region the bucket lives in.
    pub region: String,
    /// When the bucket was created.
    pub creation_date: DateTime<Utc>,
    /// Settings fixed at creation.
    pub settings: BucketSettings,
    /// The key index.
    pub objects: RwLock<KeyStore>,
}

impl std::fmt::Debug for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket")
            .field("name", &self.name)
            .field("region", &self.region)
            .field("creation_date", &self.creation_date)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Bucket {
    /// Create an empty bucket.
    #[must_use]
    pub fn new(name: String, region: String, settings: BucketSettings) -> Self {
        Self {
            name,
            region,
            creation_date: Utc::now(),
            settings,
            objects: RwLock::new(KeyStore::new(settings.versioned)),
        }
    }

    /// Whether the bucket holds no live object.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}
