//! Object access limited to what a role's policy grants.

use async_trait::async_trait;
use photostack_auth::Presigner;
use photostack_core::Arn;
use photostack_function::{PhotoSource, SourceError};
use photostack_stack::{ResolvedStatement, S3Action};
use photostack_storage::ObjectStore;
use tracing::debug;

/// A [`PhotoSource`] over the local store that enforces a role's statements.
///
/// Listing needs `s3:ListBucket` on the bucket ARN; presigning an object URL
/// needs `s3:GetObject` on the object ARN.
#[derive(Debug)]
pub struct ScopedPhotoSource<'a> {
    store: &'a ObjectStore,
    statements: &'a [ResolvedStatement],
    presigner: &'a Presigner,
    endpoint: &'a str,
}

impl<'a> ScopedPhotoSource<'a> {
    /// Scope `store` to `statements`. URLs are presigned for `endpoint`.
    #[must_use]
    pub fn new(
        store: &'a ObjectStore,
        statements: &'a [ResolvedStatement],
        presigner: &'a Presigner,
        endpoint: &'a str,
    ) -> Self {
        Self {
            store,
            statements,
            presigner,
            endpoint,
        }
    }

    fn authorize(&self, action: S3Action, resource: &Arn) -> Result<(), SourceError> {
        if self
            .statements
            .iter()
            .any(|s| s.allows(action, resource.as_str()))
        {
            Ok(())
        } else {
            debug!(%action, %resource, "access denied by role policy");
            Err(SourceError::new(format!(
                "AccessDenied: not authorized to perform {action} on {resource}"
            )))
        }
    }
}

#[async_trait]
impl PhotoSource for ScopedPhotoSource<'_> {
    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, SourceError> {
        self.authorize(S3Action::ListBucket, &Arn::s3_bucket(bucket))?;
        self.store
            .list_all_keys(bucket)
            .map_err(|e| SourceError::new(e.to_string()))
    }

    async fn object_url(&self, bucket: &str, key: &str) -> Result<String, SourceError> {
        self.authorize(S3Action::GetObject, &Arn::s3_object(bucket, key))?;
        self.presigner
            .presign_get(self.endpoint, &format!("/s3/{bucket}/{key}"))
            .map_err(|e| SourceError::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use bytes::Bytes;
    use photostack_storage::BucketSettings;

    use super::*;

    fn statement(resource: Arn, action: S3Action) -> ResolvedStatement {
        ResolvedStatement {
            principal: None,
            resource,
            actions: BTreeSet::from([action]),
        }
    }

    fn store() -> ObjectStore {
        let store = ObjectStore::new();
        store
            .create_bucket("photos", "us-east-1", BucketSettings::default())
            .unwrap();
        store
            .put_object("photos", "a.jpg", Bytes::from_static(b"a"), "image/jpeg")
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_should_list_and_presign_with_both_grants() {
        let store = store();
        let statements = vec![
            statement(Arn::s3_bucket("photos"), S3Action::ListBucket),
            statement(Arn::s3_objects("photos"), S3Action::GetObject),
        ];
        let presigner = Presigner::new("test", "test", "us-east-1", 60);
        let source = ScopedPhotoSource::new(&store, &statements, &presigner, "http://127.0.0.1:4566");

        assert_eq!(source.list_keys("photos").await.unwrap(), vec!["a.jpg"]);
        let url = source.object_url("photos", "a.jpg").await.unwrap();
        assert!(url.starts_with("http://127.0.0.1:4566/s3/photos/a.jpg?"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[tokio::test]
    async fn test_should_encode_literal_percent_in_key_once() {
        let store = store();
        let statements = vec![statement(Arn::s3_objects("photos"), S3Action::GetObject)];
        let presigner = Presigner::new("test", "test", "us-east-1", 60);
        let source = ScopedPhotoSource::new(&store, &statements, &presigner, "http://127.0.0.1:4566");

        let url = source.object_url("photos", "a%41.jpg").await.unwrap();
        assert!(url.starts_with("http://127.0.0.1:4566/s3/photos/a%2541.jpg?"));
    }

    #[tokio::test]
    async fn test_should_deny_listing_without_list_bucket() {
        let store = store();
        let statements = vec![statement(Arn::s3_objects("photos"), S3Action::GetObject)];
        let presigner = Presigner::new("test", "test", "us-east-1", 60);
        let source = ScopedPhotoSource::new(&store, &statements, &presigner, "http://127.0.0.1:4566");

        let err = source.list_keys("photos").await.unwrap_err();
        assert!(err.message.starts_with("AccessDenied"));
    }

    #[tokio::test]
    async fn test_should_deny_presign_without_get_object() {
        let store = store();
        let statements = vec![statement(Arn::s3_bucket("photos"), S3Action::ListBucket)];
        let presigner = Presigner::new("test", "test", "us-east-1", 60);
        let source = ScopedPhotoSource::new(&store, &statements, &presigner, "http://127.0.0.1:4566");

        assert!(source.object_url("photos", "a.jpg").await.is_err());
    }
}
