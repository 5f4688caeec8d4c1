//! Stored object and version types.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};

/// The ETag S3 reports for a single-part upload of `data`: its MD5 digest in
/// hex, wrapped in double quotes.
///
/// ```
/// use photostack_storage::object::etag_of;
///
/// assert_eq!(etag_of(b"hello"), "\"5d41402abc4b2a76b9719d911017c592\"");
/// ```
#[must_use]
pub fn etag_of(data: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Md5::digest(data)))
}

/// An object body together with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// The object key.
    pub key: String,
    /// The object body.
    pub data: Bytes,
    /// Quoted MD5 ETag of the body.
    pub etag: String,
    /// MIME type served with the object.
    pub content_type: String,
    /// Version ID, or `"null"` in an unversioned bucket.
    pub version_id: String,
    /// When the object was written.
    pub last_modified: DateTime<Utc>,
}

impl StoredObject {
    /// Build an object, computing its ETag from `data`.
    #[must_use]
    pub fn new(key: impl Into<String>, data: Bytes, content_type: impl Into<String>) -> Self {
        let etag = etag_of(&data);
        Self {
            key: key.into(),
            data,
            etag,
            content_type: content_type.into(),
            version_id: "null".to_owned(),
            last_modified: Utc::now(),
        }
    }

    /// Size of the body in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// One entry in a key's version history.
#[derive(Debug, Clone)]
pub enum ObjectVersion {
    /// A real object version.
    Object(StoredObject),
    /// A delete marker hiding earlier versions.
    DeleteMarker {
        /// The marker's version ID.
        version_id: String,
    },
}

impl ObjectVersion {
    /// The object, unless this is a delete marker.
    #[must_use]
    pub fn as_object(&self) -> Option<&StoredObject> {
        match self {
            Self::Object(o) => Some(o),
            Self::DeleteMarker { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_tag_empty_body_with_empty_digest() {
        assert_eq!(etag_of(b""), "\"d41d8cd98f00b204e9800998ecf8427e\"");
    }

    #[test]
    fn test_should_derive_etag_and_size_from_body() {
        let object = StoredObject::new("a.jpg", Bytes::from_static(b"jpeg"), "image/jpeg");
        assert_eq!(object.etag, etag_of(b"jpeg"));
        assert_ne!(object.etag, etag_of(b"png"));
        assert_eq!(object.size(), 4);
        assert_eq!(object.version_id, "null");
    }
}
