//! The bucket registry and object operations.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};

use crate::bucket::{Bucket, BucketSettings};
use crate::error::{StorageError, StorageResult};
use crate::keystore::{ListResult, decode_continuation_token};
use crate::object::StoredObject;
use crate::validation::{validate_bucket_name, validate_object_key};

/// Default page size for listings.
pub const DEFAULT_MAX_KEYS: usize = 1000;

/// In-memory object store shared by every component of the local cloud.
///
/// Buckets are held in a `DashMap` and each bucket's keys behind a
/// `parking_lot::RwLock`, so concurrent readers never block one another.
#[derive(Debug, Default)]
pub struct ObjectStore {
    buckets: DashMap<String, Arc<Bucket>>,
}

impl ObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidBucketName`] for a malformed name and
    /// [`StorageError::BucketAlreadyExists`] if the name is taken.
    pub fn create_bucket(
        &self,
        name: &str,
        region: &str,
        settings: BucketSettings,
    ) -> StorageResult<Arc<Bucket>> {
        validate_bucket_name(name)?;

        match self.buckets.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(StorageError::BucketAlreadyExists {
                bucket: name.to_owned(),
            }),
            Entry::Vacant(entry) => {
                let bucket = Arc::new(Bucket::new(name.to_owned(), region.to_owned(), settings));
                entry.insert(Arc::clone(&bucket));
                info!(bucket = %name, region, versioned = settings.versioned, "created bucket");
                Ok(bucket)
            }
        }
    }

    /// Delete an empty bucket.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchBucket`] if it does not exist and
    /// [`StorageError::BucketNotEmpty`] while it still holds live objects.
    pub fn delete_bucket(&self, name: &str) -> StorageResult<()> {
        let removed = self
            .buckets
            .remove_if(name, |_, bucket| bucket.is_empty())
            .is_some();
        if removed {
            info!(bucket = %name, "deleted bucket");
            return Ok(());
        }
        if self.bucket_exists(name) {
            Err(StorageError::BucketNotEmpty {
                bucket: name.to_owned(),
            })
        } else {
            Err(StorageError::NoSuchBucket {
                bucket: name.to_owned(),
            })
        }
    }

    /// Delete every live object in a bucket and return how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchBucket`] if the bucket does not exist.
    pub fn empty_bucket(&self, bucket: &str) -> StorageResult<usize> {
        let keys = self.list_all_keys(bucket)?;
        for key in &keys {
            self.delete_object(bucket, key)?;
        }
        Ok(keys.len())
    }

    /// Look up a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchBucket`] if it does not exist.
    pub fn get_bucket(&self, name: &str) -> StorageResult<Arc<Bucket>> {
        self.buckets
            .get(name)
            .map(|b| Arc::clone(b.value()))
            .ok_or_else(|| StorageError::NoSuchBucket {
                bucket: name.to_owned(),
            })
    }

    /// Whether a bucket exists.
    #[must_use]
    pub fn bucket_exists(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    /// All bucket names, sorted.
    #[must_use]
    pub fn bucket_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    /// Store an object and return its ETag.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchBucket`] or an invalid key error.
    pub fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        validate_object_key(key)?;
        let bucket = self.get_bucket(bucket)?;
        let object = StoredObject::new(key, data, content_type);
        let etag = object.etag.clone();
        let size = object.size();
        let version_id = bucket.objects.write().put(object);
        debug!(bucket = %bucket.name, key, size, etag = %etag, version_id, "put object");
        Ok(etag)
    }

    /// Fetch the current version of an object.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchBucket`] or [`StorageError::NoSuchKey`].
    pub fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        let b = self.get_bucket(bucket)?;
        let store = b.objects.read();
        store.get(key).cloned().ok_or_else(|| StorageError::NoSuchKey {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        })
    }

    /// Delete an object. Returns whether a live object was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchBucket`] if the bucket does not exist.
    pub fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let b = self.get_bucket(bucket)?;
        let removed = b.objects.write().delete(key);
        debug!(bucket, key, removed, "delete object");
        Ok(removed)
    }

    /// List one page of objects.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchBucket`] or an invalid token error.
    pub fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
        max_keys: usize,
    ) -> StorageResult<ListResult> {
        let start_after = continuation_token
            .map(decode_continuation_token)
            .transpose()?
            .unwrap_or_default();
        let b = self.get_bucket(bucket)?;
        let result = b.objects.read().list_objects(prefix, &start_after, max_keys);
        Ok(result)
    }

    /// List every key in a bucket, following continuation tokens.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchBucket`] if the bucket does not exist.
    pub fn list_all_keys(&self, bucket: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.list_objects(bucket, "", token.as_deref(), DEFAULT_MAX_KEYS)?;
            keys.extend(page.objects.into_iter().map(|o| o.key));
            match page.next_continuation_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(keys)
    }
}
