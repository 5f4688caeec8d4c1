//! Local directory to bucket synchronization.
//!
//! Mirrors a directory tree into a bucket the way a one-shot asset deployment
//! does: new or changed files are uploaded, identical files (same MD5 ETag)
//! are left alone, and objects with no counterpart in the source are pruned.
//! Re-running a sync over unchanged content touches nothing.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::object::etag_of;
use crate::store::ObjectStore;

/// Outcome of one directory synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Keys written because they were new or their content changed.
    pub uploaded: Vec<String>,
    /// Number of files whose stored object already matched.
    pub unchanged: usize,
    /// Keys removed because they no longer exist in the source.
    pub deleted: Vec<String>,
}

impl SyncReport {
    /// Whether the sync changed nothing in the bucket.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.uploaded.is_empty() && self.deleted.is_empty()
    }
}

/// Mirror `source` into `bucket`.
///
/// Keys are paths relative to `source` with `/` separators. Content types
/// are guessed from file extensions.
///
/// # Errors
///
/// Returns [`StorageError::Io`] if the tree cannot be read and
/// [`StorageError::NoSuchBucket`] if the bucket does not exist.
pub fn sync_directory(store: &ObjectStore, bucket: &str, source: &Path) -> StorageResult<SyncReport> {
    let files = collect_files(source)?;
    let mut report = SyncReport::default();

    for (key, path) in &files {
        let data = fs::read(path).map_err(|e| StorageError::io(path, e))?;
        let etag = etag_of(&data);

        match store.get_object(bucket, key) {
            Ok(existing) if existing.etag == etag => {
                report.unchanged += 1;
                continue;
            }
            Ok(_) | Err(StorageError::NoSuchKey { .. }) => {}
            Err(e) => return Err(e),
        }

        let content_type = mime_guess::from_path(path).first_or_octet_stream().to_string();
        store.put_object(bucket, key, Bytes::from(data), &content_type)?;
        report.uploaded.push(key.clone());
    }

    for key in store.list_all_keys(bucket)? {
        if !files.contains_key(&key) {
            store.delete_object(bucket, &key)?;
            report.deleted.push(key);
        }
    }

    info!(
        bucket,
        source = %source.display(),
        uploaded = report.uploaded.len(),
        unchanged = report.unchanged,
        deleted = report.deleted.len(),
        "synchronized directory"
    );
    Ok(report)
}

fn collect_files(root: &Path) -> StorageResult<BTreeMap<String, PathBuf>> {
    let mut files = BTreeMap::new();
    walk(root, root, &mut files)?;
    Ok(files)
}

fn walk(root: &Path, dir: &Path, files: &mut BTreeMap<String, PathBuf>) -> StorageResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| StorageError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io(dir, e))?;
        let path = entry.path();
        let metadata = fs::metadata(&path).map_err(|e| StorageError::io(&path, e))?;
        if metadata.is_dir() {
            walk(root, &path, files)?;
        } else if metadata.is_file() {
            let key = object_key(root, &path);
            debug!(key, path = %path.display(), "found source file");
            files.insert(key, path);
        }
    }
    Ok(())
}

fn object_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// One source directory and the bucket it is deployed into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentEntry {
    /// Local directory whose contents are uploaded.
    pub source: PathBuf,
    /// Physical destination bucket name.
    pub bucket: String,
}

/// Ordered list of directory deployments applied once per provisioning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentManifest {
    entries: Vec<DeploymentEntry>,
}

impl DeploymentManifest {
    /// Create an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a deployment.
    pub fn push(&mut self, source: impl Into<PathBuf>, bucket: impl Into<String>) {
        self.entries.push(DeploymentEntry {
            source: source.into(),
            bucket: bucket.into(),
        });
    }

    /// The deployments, in application order.
    #[must_use]
    pub fn entries(&self) -> &[DeploymentEntry] {
        &self.entries
    }

    /// Apply every deployment in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`StorageError`] raised by [`sync_directory`].
    pub fn apply(&self, store: &ObjectStore) -> StorageResult<Vec<SyncReport>> {
        self.entries
            .iter()
            .map(|entry| sync_directory(store, &entry.bucket, &entry.source))
            .collect()
    }
}
