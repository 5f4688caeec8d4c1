//! The photo record exchanged between the listing function and its callers.

use serde::{Deserialize, Serialize};

/// One listed photo: the object's base name and an absolute, fetchable URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Base name of the object key (everything after the last `/`).
    pub filename: String,
    /// Absolute URL the browser can fetch the image from.
    pub url: String,
}

impl PhotoRecord {
    /// Build a record for an object key, deriving the file name from it.
    /// A trailing `/` is ignored, so `2024/` is named `2024`.
    #[must_use]
    pub fn from_key(key: &str, url: impl Into<String>) -> Self {
        let trimmed = key.strip_suffix('/').unwrap_or(key);
        let filename = trimmed.rsplit('/').next().unwrap_or(trimmed).to_owned();
        Self {
            filename,
            url: url.into(),
        }
    }
}
