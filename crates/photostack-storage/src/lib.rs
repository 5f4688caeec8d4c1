//! Object storage for PhotoStack.
//!
//! [`ObjectStore`] is an in-memory, S3-shaped store: buckets hold sorted keys,
//! optionally versioned, each object carrying its MD5 ETag. On top of it,
//! [`sync_directory`] mirrors a local directory tree into a bucket and a
//! [`DeploymentManifest`] applies a list of such synchronizations in order.

pub mod bucket;
pub mod error;
pub mod keystore;
pub mod object;
pub mod store;
pub mod sync;
pub mod validation;

pub use bucket::{Bucket, BucketSettings, Encryption};
pub use error::{StorageError, StorageResult};
pub use keystore::ListResult;
pub use object::StoredObject;
pub use store::ObjectStore;
pub use sync::{DeploymentEntry, DeploymentManifest, SyncReport, sync_directory};
