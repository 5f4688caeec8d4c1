//! Object key storage with optional versioning.
//!
//! Keys live in a `BTreeMap` so listings are always lexicographic, which is
//! what continuation-token pagination relies on.

use std::collections::BTreeMap;
use std::ops::Bound;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use tracing::debug;
use uuid::Uuid;

use crate::error::StorageError;
use crate::object::{ObjectVersion, StoredObject};

/// Result of a single listing page.
#[derive(Debug, Clone, Default)]
pub struct ListResult {
    /// The objects on this page, in key order.
    pub objects: Vec<StoredObject>,
    /// Whether more keys follow.
    pub is_truncated: bool,
    /// Token to pass back for the next page.
    pub next_continuation_token: Option<String>,
}

/// Per-bucket key index.
///
/// Unversioned stores keep a single entry per key; versioned stores keep the
/// full history with the latest version last.
#[derive(Debug, Default)]
pub struct KeyStore {
    versioned: bool,
    entries: BTreeMap<String, Vec<ObjectVersion>>,
}

impl KeyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(versioned: bool) -> Self {
        Self {
            versioned,
            entries: BTreeMap::new(),
        }
    }

    /// Whether every write is retained as a new version.
    #[must_use]
    pub fn is_versioned(&self) -> bool {
        self.versioned
    }

    /// Store an object and return the version ID it was assigned.
    pub fn put(&mut self, mut object: StoredObject) -> String {
        let key = object.key.clone();
        if self.versioned {
            object.version_id = Uuid::new_v4().simple().to_string();
            let version_id = object.version_id.clone();
            self.entries
                .entry(key)
                .or_default()
                .push(ObjectVersion::Object(object));
            version_id
        } else {
            object.version_id = "null".to_owned();
            self.entries.insert(key, vec![ObjectVersion::Object(object)]);
            "null".to_owned()
        }
    }

    /// The current object for `key`, if it exists and is not deleted.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StoredObject> {
        self.entries
            .get(key)
            .and_then(|versions| versions.last())
            .and_then(ObjectVersion::as_object)
    }

    /// Delete `key`. Versioned stores append a delete marker instead of
    /// dropping history. Returns whether a live object was hidden or removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let existed = self.get(key).is_some();
        if self.versioned {
            if existed {
                let version_id = Uuid::new_v4().simple().to_string();
                debug!(key, version_id, "inserting delete marker");
                self.entries
                    .entry(key.to_owned())
                    .or_default()
                    .push(ObjectVersion::DeleteMarker { version_id });
            }
        } else {
            self.entries.remove(key);
        }
        existed
    }

    /// Number of versions (objects and delete markers) recorded for `key`.
    #[must_use]
    pub fn version_count(&self, key: &str) -> usize {
        self.entries.get(key).map_or(0, Vec::len)
    }

    /// Number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live().count()
    }

    /// Whether no live object exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live().next().is_none()
    }

    /// List live objects under `prefix` strictly after `start_after`.
    #[must_use]
    pub fn list_objects(&self, prefix: &str, start_after: &str, max_keys: usize) -> ListResult {
        let lower = if start_after.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(start_after)
        };

        let mut objects = Vec::new();
        let mut is_truncated = false;
        for (_, versions) in self
            .entries
            .range::<str, _>((lower, Bound::Unbounded))
            .filter(|(key, _)| key.starts_with(prefix))
        {
            let Some(object) = versions.last().and_then(ObjectVersion::as_object) else {
                continue;
            };
            if objects.len() == max_keys {
                is_truncated = true;
                break;
            }
            objects.push(object.clone());
        }

        let next_continuation_token = if is_truncated {
            objects.last().map(|o| encode_continuation_token(&o.key))
        } else {
            None
        };

        ListResult {
            objects,
            is_truncated,
            next_continuation_token,
        }
    }

    fn live(&self) -> impl Iterator<Item = &StoredObject> {
        self.entries
            .values()
            .filter_map(|versions| versions.last().and_then(ObjectVersion::as_object))
    }
}

/// Encode an object key as an opaque continuation token.
#[must_use]
pub fn encode_continuation_token(key: &str) -> String {
    BASE64_STANDARD.encode(key.as_bytes())
}

/// Decode a continuation token back to the key it was produced from.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] if the token is not valid base64
/// or does not decode to UTF-8.
pub fn decode_continuation_token(token: &str) -> Result<String, StorageError> {
    let bytes = BASE64_STANDARD
        .decode(token)
        .map_err(|_| StorageError::InvalidArgument {
            message: "Invalid continuation token".to_owned(),
        })?;
    String::from_utf8(bytes).map_err(|_| StorageError::InvalidArgument {
        message: "Continuation token contains invalid UTF-8".to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn object(key: &str, body: &'static [u8]) -> StoredObject {
        StoredObject::new(key, Bytes::from_static(body), "image/jpeg")
    }

    #[test]
    fn test_should_overwrite_in_unversioned_store() {
        let mut store = KeyStore::new(false);
        store.put(object("a.jpg", b"one"));
        store.put(object("a.jpg", b"two"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.version_count("a.jpg"), 1);
        assert_eq!(store.get("a.jpg").map(|o| o.data.as_ref()), Some(&b"two"[..]));
    }

    #[test]
    fn test_should_keep_history_in_versioned_store() {
        let mut store = KeyStore::new(true);
        let v1 = store.put(object("index.html", b"one"));
        let v2 = store.put(object("index.html", b"two"));

        assert_ne!(v1, v2);
        assert_ne!(v1, "null");
        assert_eq!(store.version_count("index.html"), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_should_hide_object_behind_delete_marker() {
        let mut store = KeyStore::new(true);
        store.put(object("a.jpg", b"one"));

        assert!(store.delete("a.jpg"));
        assert!(store.get("a.jpg").is_none());
        assert_eq!(store.version_count("a.jpg"), 2);
        assert!(store.is_empty());
        assert!(!store.delete("a.jpg"));
    }

    #[test]
    fn test_should_list_in_lexicographic_order() {
        let mut store = KeyStore::new(false);
        store.put(object("b.png", b"b"));
        store.put(object("a.jpg", b"a"));
        store.put(object("c/d.gif", b"d"));

        let result = store.list_objects("", "", 1000);
        let keys: Vec<&str> = result.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a.jpg", "b.png", "c/d.gif"]);
        assert!(!result.is_truncated);
        assert!(result.next_continuation_token.is_none());
    }

    #[test]
    fn test_should_paginate_with_continuation_token() {
        let mut store = KeyStore::new(false);
        for key in ["a", "b", "c"] {
            store.put(object(key, b"x"));
        }

        let first = store.list_objects("", "", 2);
        assert_eq!(first.objects.len(), 2);
        assert!(first.is_truncated);

        let token = first.next_continuation_token.unwrap();
        let start_after = decode_continuation_token(&token).unwrap();
        assert_eq!(start_after, "b");

        let second = store.list_objects("", &start_after, 2);
        assert_eq!(second.objects.len(), 1);
        assert_eq!(second.objects[0].key, "c");
        assert!(!second.is_truncated);
    }

    #[test]
    fn test_should_filter_by_prefix() {
        let mut store = KeyStore::new(false);
        store.put(object("2024/a.jpg", b"a"));
        store.put(object("2025/b.jpg", b"b"));

        let result = store.list_objects("2025/", "", 1000);
        assert_eq!(result.objects.len(), 1);
        assert_eq!(result.objects[0].key, "2025/b.jpg");
    }

    #[test]
    fn test_should_reject_invalid_continuation_token() {
        assert!(decode_continuation_token("!!!").is_err());
    }
}
