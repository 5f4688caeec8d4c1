//! The in-process cloud.
//!
//! [`LocalCloud`] is a [`ProvisioningBackend`] that creates every resource
//! kind in memory, and it can invoke the functions it has deployed. The
//! [`crate::LocalGateway`] serves those resources over HTTP.

use async_trait::async_trait;
use photostack_auth::{Keyring, Presigner};
use photostack_core::{Arn, StackConfig};
use photostack_function::ApiGatewayResponse;
use photostack_stack::{
    Attribute, BackendError, BucketEncryption, LogicalId, ProvisioningBackend, ResolvedSpec,
    ResourceOutputs,
};
use photostack_storage::{BucketSettings, Encryption, ObjectStore, sync_directory};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{LocalError, LocalResult};
use crate::registry::{HandlerRegistry, InvocationContext};
use crate::scoped::ScopedPhotoSource;
use crate::state::{
    ApiRecord, CloudState, DistributionRecord, FunctionRecord, IdentityRecord, RoleRecord,
    RouteRecord,
};

const MAX_BUCKET_NAME_LEN: usize = 63;

/// An in-memory cloud that provisions resources and runs functions.
///
/// Every apply creates fresh resources: buckets get a new random suffix and
/// APIs and distributions new ids. Applying the same stack twice therefore
/// yields two independent deployments rather than reconciling the first.
/// Re-syncing content into an existing deployment goes through
/// [`photostack_stack::Stack::deployment_manifest`] instead.
#[derive(Debug)]
pub struct LocalCloud {
    config: StackConfig,
    endpoint: String,
    state: CloudState,
    registry: HandlerRegistry,
    presigner: Presigner,
    keyring: Keyring,
}

impl LocalCloud {
    /// A cloud with the built-in handlers registered.
    #[must_use]
    pub fn new(config: StackConfig) -> Self {
        Self::with_registry(config, HandlerRegistry::with_defaults())
    }

    /// A cloud that runs handlers from `registry`.
    #[must_use]
    pub fn with_registry(config: StackConfig, registry: HandlerRegistry) -> Self {
        let presigner = Presigner::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            config.default_region.as_str(),
            config.presign_expiry_secs,
        );
        let keyring = Keyring::new().with_key(&config.access_key, &config.secret_key);
        Self {
            endpoint: config.endpoint_url(),
            config,
            state: CloudState::default(),
            registry,
            presigner,
            keyring,
        }
    }

    /// The configuration this cloud was started with.
    #[must_use]
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Everything provisioned so far.
    #[must_use]
    pub fn state(&self) -> &CloudState {
        &self.state
    }

    /// The object store.
    #[must_use]
    pub fn store(&self) -> &ObjectStore {
        &self.state.store
    }

    /// Keys presigned URLs are verified against.
    #[must_use]
    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    /// Base URL every generated URL points at.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Invoke a deployed function with its role's permissions.
    pub async fn invoke(&self, function_name: &str) -> LocalResult<ApiGatewayResponse> {
        let function = self.state.function(function_name)?;
        let role = self.state.role(&function.role_name)?;
        let handler =
            self.registry
                .get(&function.handler)
                .ok_or_else(|| LocalError::UnknownHandler {
                    handler: function.handler.clone(),
                    entry_point: function.entry_point.clone(),
                })?;

        let source = ScopedPhotoSource::new(
            &self.state.store,
            &role.statements,
            &self.presigner,
            &self.endpoint,
        );
        let ctx = InvocationContext {
            function_name: &function.name,
            env: &function.env,
            source: &source,
        };
        let response = handler.invoke(&ctx).await;
        info!(
            function = %function.name,
            status = response.status_code,
            "invoked function"
        );
        Ok(response)
    }

    fn provision_resource(
        &self,
        logical_id: &LogicalId,
        spec: &ResolvedSpec,
    ) -> LocalResult<ResourceOutputs> {
        match spec {
            ResolvedSpec::Bucket(options) => {
                let name = self.bucket_name(logical_id);
                let settings = BucketSettings {
                    versioned: options.versioned,
                    encryption: match options.encryption {
                        BucketEncryption::None => Encryption::None,
                        BucketEncryption::S3Managed => Encryption::Aes256,
                    },
                };
                let region = self.config.default_region.as_str();
                self.state.store.create_bucket(&name, region, settings)?;
                Ok(ResourceOutputs::new()
                    .with(Attribute::Arn, Arn::s3_bucket(&name).as_str())
                    .with(
                        Attribute::DomainName,
                        format!("{name}.s3.{region}.localhost"),
                    )
                    .with(Attribute::Name, name))
            }
            ResolvedSpec::BucketDeployment { source, bucket } => {
                let report = sync_directory(&self.state.store, bucket, source)?;
                debug!(bucket, uploaded = report.uploaded.len(), "deployment synchronized");
                Ok(ResourceOutputs::new().with(Attribute::Id, format!("{bucket}/{logical_id}")))
            }
            ResolvedSpec::OriginAccessIdentity { comment } => {
                let id = format!("E{}", short_id(13).to_ascii_uppercase());
                self.state.identities.insert(
                    id.clone(),
                    IdentityRecord {
                        id: id.clone(),
                        comment: comment.clone(),
                    },
                );
                Ok(ResourceOutputs::new().with(Attribute::Id, id))
            }
            ResolvedSpec::BucketPolicy { bucket, statements } => {
                self.state.store.get_bucket(bucket)?;
                self.state
                    .bucket_policies
                    .insert(bucket.clone(), statements.clone());
                Ok(ResourceOutputs::new().with(Attribute::Id, bucket.clone()))
            }
            ResolvedSpec::Role { assumed_by } => {
                let name = self.physical_name(logical_id);
                let arn = Arn::iam_role(&self.config.account_id, &name);
                self.state.roles.insert(
                    name.clone(),
                    RoleRecord {
                        name: name.clone(),
                        arn: arn.as_str().to_owned(),
                        assumed_by: assumed_by.clone(),
                        statements: Vec::new(),
                    },
                );
                Ok(ResourceOutputs::new()
                    .with(Attribute::Arn, arn.as_str())
                    .with(Attribute::Name, name))
            }
            ResolvedSpec::RolePolicy { role, statements } => {
                let mut record = self
                    .state
                    .roles
                    .get_mut(role)
                    .ok_or_else(|| LocalError::NoSuchRole(role.clone()))?;
                record.statements.extend(statements.iter().cloned());
                Ok(ResourceOutputs::new().with(Attribute::Name, logical_id.as_str()))
            }
            ResolvedSpec::Function {
                entry_point,
                handler,
                runtime,
                role_arn,
                env,
            } => {
                if !self.registry.contains(handler) {
                    return Err(LocalError::UnknownHandler {
                        handler: handler.clone(),
                        entry_point: entry_point.clone(),
                    });
                }
                let role = self.state.role_by_arn(role_arn)?;
                let name = self.physical_name(logical_id);
                let arn = Arn::lambda_function(
                    &self.config.default_region,
                    &self.config.account_id,
                    &name,
                );
                self.state.functions.insert(
                    name.clone(),
                    FunctionRecord {
                        name: name.clone(),
                        arn: arn.as_str().to_owned(),
                        handler: handler.clone(),
                        runtime: runtime.clone(),
                        entry_point: entry_point.clone(),
                        role_name: role.name,
                        env: env.clone(),
                    },
                );
                Ok(ResourceOutputs::new()
                    .with(Attribute::Arn, arn.as_str())
                    .with(Attribute::Name, name))
            }
            ResolvedSpec::HttpApi { name, cors } => {
                let id = short_id(10);
                let url = format!("{}/api/{id}/", self.endpoint);
                self.state.apis.insert(
                    id.clone(),
                    ApiRecord {
                        id: id.clone(),
                        name: name.clone(),
                        cors: cors.clone(),
                        routes: Vec::new(),
                    },
                );
                Ok(ResourceOutputs::new()
                    .with(Attribute::Id, id)
                    .with(Attribute::Url, url))
            }
            ResolvedSpec::Route {
                api_id,
                method,
                path,
                function_arn,
            } => {
                let function = self.state.function_by_arn(function_arn)?;
                let mut api = self
                    .state
                    .apis
                    .get_mut(api_id)
                    .ok_or_else(|| LocalError::NoSuchApi(api_id.clone()))?;
                let id = short_id(7);
                api.routes.push(RouteRecord {
                    id: id.clone(),
                    method: method.clone(),
                    path: path.clone(),
                    function_name: function.name,
                });
                Ok(ResourceOutputs::new().with(Attribute::Id, id))
            }
            ResolvedSpec::Distribution {
                bucket,
                identity_id,
                default_root_object,
            } => {
                self.state.store.get_bucket(bucket)?;
                if !self.state.identities.contains_key(identity_id) {
                    return Err(LocalError::NoSuchIdentity(identity_id.clone()));
                }
                let id = format!("E{}", short_id(13).to_ascii_uppercase());
                let url = format!("{}/cdn/{id}/", self.endpoint);
                let domain = format!("{}.cloudfront.localhost", id.to_ascii_lowercase());
                self.state.distributions.insert(
                    id.clone(),
                    DistributionRecord {
                        id: id.clone(),
                        bucket: bucket.clone(),
                        identity_id: identity_id.clone(),
                        default_root_object: default_root_object.clone(),
                    },
                );
                Ok(ResourceOutputs::new()
                    .with(Attribute::Id, id)
                    .with(Attribute::DomainName, domain)
                    .with(Attribute::Url, url))
            }
        }
    }

    fn deprovision_resource(
        &self,
        spec: &ResolvedSpec,
        outputs: &ResourceOutputs,
    ) -> LocalResult<()> {
        let output = move |attribute: Attribute| outputs.get(attribute).unwrap_or_default();
        match spec {
            ResolvedSpec::Bucket(_) => {
                let name = output(Attribute::Name);
                if self.state.store.bucket_exists(name) {
                    self.state.store.empty_bucket(name)?;
                    self.state.store.delete_bucket(name)?;
                }
                self.state.bucket_policies.remove(name);
            }
            ResolvedSpec::BucketDeployment { bucket, .. } => {
                if self.state.store.bucket_exists(bucket) {
                    let removed = self.state.store.empty_bucket(bucket)?;
                    debug!(bucket, removed, "deployment removed");
                }
            }
            ResolvedSpec::OriginAccessIdentity { .. } => {
                self.state.identities.remove(output(Attribute::Id));
            }
            ResolvedSpec::BucketPolicy { bucket, .. } => {
                self.state.bucket_policies.remove(bucket);
            }
            ResolvedSpec::Role { .. } => {
                self.state.roles.remove(output(Attribute::Name));
            }
            ResolvedSpec::RolePolicy { role, statements } => {
                if let Some(mut record) = self.state.roles.get_mut(role) {
                    record.statements.retain(|s| !statements.contains(s));
                }
            }
            ResolvedSpec::Function { .. } => {
                self.state.functions.remove(output(Attribute::Name));
            }
            ResolvedSpec::HttpApi { .. } => {
                self.state.apis.remove(output(Attribute::Id));
            }
            ResolvedSpec::Route { api_id, .. } => {
                if let Some(mut api) = self.state.apis.get_mut(api_id) {
                    let id = output(Attribute::Id);
                    api.routes.retain(|r| r.id != id);
                }
            }
            ResolvedSpec::Distribution { .. } => {
                self.state.distributions.remove(output(Attribute::Id));
            }
        }
        Ok(())
    }

    /// `{stack}-{logicalid}-{suffix}`, lowercased and cut to the bucket
    /// name limit.
    fn bucket_name(&self, logical_id: &LogicalId) -> String {
        let suffix = short_id(8);
        let mut prefix = format!(
            "{}-{}",
            self.config.stack_name.to_ascii_lowercase(),
            logical_id.as_str().to_ascii_lowercase()
        );
        prefix.truncate(MAX_BUCKET_NAME_LEN - suffix.len() - 1);
        format!("{}-{suffix}", prefix.trim_end_matches('-'))
    }

    fn physical_name(&self, logical_id: &LogicalId) -> String {
        format!("{}-{logical_id}", self.config.stack_name)
    }
}

#[async_trait]
impl ProvisioningBackend for LocalCloud {
    async fn provision(
        &self,
        logical_id: &LogicalId,
        spec: &ResolvedSpec,
    ) -> Result<ResourceOutputs, BackendError> {
        let outputs = self.provision_resource(logical_id, spec)?;
        info!(%logical_id, outputs = ?outputs, "provisioned resource");
        Ok(outputs)
    }

    async fn deprovision(
        &self,
        logical_id: &LogicalId,
        spec: &ResolvedSpec,
        outputs: &ResourceOutputs,
    ) -> Result<(), BackendError> {
        self.deprovision_resource(spec, outputs)?;
        info!(%logical_id, "deprovisioned resource");
        Ok(())
    }
}

/// `len` lowercase hex characters from a random UUID.
fn short_id(len: usize) -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(len);
    id
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use http::StatusCode;
    use photostack_core::PhotoRecord;
    use photostack_stack::topology::exports;
    use photostack_stack::{Deployed, StackError, StackOutputs, photo_stack};

    use super::*;

    fn config(root: &Path) -> StackConfig {
        let photos = root.join("photos");
        let site = root.join("site");
        std::fs::create_dir_all(photos.join("2024")).unwrap();
        std::fs::create_dir_all(&site).unwrap();
        std::fs::write(photos.join("a.jpg"), b"jpeg-a").unwrap();
        std::fs::write(photos.join("2024").join("b.png"), b"png-b").unwrap();
        std::fs::write(site.join("index.html"), b"<html></html>").unwrap();
        StackConfig::builder()
            .photos_dir(photos)
            .site_dir(site)
            .public_endpoint("http://127.0.0.1:4566".to_owned())
            .build()
    }

    async fn deploy(cloud: &LocalCloud) -> (Deployed, StackOutputs) {
        let stack = photo_stack(cloud.config()).unwrap();
        let deployed = stack.apply(cloud).await.unwrap();
        let outputs = stack.finalize_outputs(&deployed).unwrap();
        (deployed, outputs)
    }

    #[tokio::test]
    async fn test_should_provision_photo_stack() {
        let dir = tempfile::tempdir().unwrap();
        let cloud = LocalCloud::new(config(dir.path()));
        let (_, outputs) = deploy(&cloud).await;

        let bucket = &outputs[exports::BUCKET_NAME];
        assert!(bucket.starts_with("photostack-photobucket-"));
        assert_eq!(
            cloud.store().list_all_keys(bucket).unwrap(),
            vec!["2024/b.png", "a.jpg"]
        );
        let site_bucket = &outputs[exports::WEBSITE_BUCKET_NAME];
        assert!(cloud.store().get_object(site_bucket, "index.html").is_ok());
        assert!(outputs[exports::API_ENDPOINT].starts_with("http://127.0.0.1:4566/api/"));
        assert!(outputs[exports::API_ENDPOINT].ends_with('/'));
        assert!(outputs[exports::WEBSITE_URL].starts_with("http://127.0.0.1:4566/cdn/E"));
        assert_eq!(outputs[exports::FUNCTION], "photostack-GetPhotos");
    }

    #[tokio::test]
    async fn test_should_invoke_get_photos_with_presigned_urls() {
        let dir = tempfile::tempdir().unwrap();
        let cloud = LocalCloud::new(config(dir.path()));
        let (_, outputs) = deploy(&cloud).await;

        let response = cloud.invoke(&outputs[exports::FUNCTION]).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let records: Vec<PhotoRecord> = serde_json::from_str(&response.body).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["b.png", "a.jpg"]);
        let bucket = &outputs[exports::BUCKET_NAME];
        assert!(
            records[1]
                .url
                .starts_with(&format!("http://127.0.0.1:4566/s3/{bucket}/a.jpg?"))
        );
    }

    #[tokio::test]
    async fn test_should_deny_listing_without_list_bucket_grant() {
        let dir = tempfile::tempdir().unwrap();
        let cloud = LocalCloud::new(config(dir.path()));
        let (_, outputs) = deploy(&cloud).await;

        let function = cloud.state().function(&outputs[exports::FUNCTION]).unwrap();
        cloud
            .state()
            .roles
            .get_mut(&function.role_name)
            .unwrap()
            .statements
            .retain(|s| !s.actions.contains(&photostack_stack::S3Action::ListBucket));

        let response = cloud.invoke(&function.name).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(response.body.contains("AccessDenied"));
    }

    #[tokio::test]
    async fn test_should_reject_function_with_unknown_handler() {
        let dir = tempfile::tempdir().unwrap();
        let cloud = LocalCloud::with_registry(config(dir.path()), HandlerRegistry::new());
        let stack = photo_stack(cloud.config()).unwrap();

        let err = stack.apply(&cloud).await.unwrap_err();
        match err {
            StackError::Provisioning {
                logical_id,
                message,
            } => {
                assert_eq!(logical_id.as_str(), "GetPhotos");
                assert!(message.contains("getPhotos"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_should_leave_nothing_behind_after_failed_apply() {
        let dir = tempfile::tempdir().unwrap();
        let cloud = LocalCloud::with_registry(config(dir.path()), HandlerRegistry::new());
        let stack = photo_stack(cloud.config()).unwrap();

        assert!(stack.apply(&cloud).await.is_err());

        let state = cloud.state();
        assert!(state.store.bucket_names().is_empty());
        assert!(state.roles.is_empty());
        assert!(state.functions.is_empty());
        assert!(state.identities.is_empty());
        assert!(state.bucket_policies.is_empty());
        assert!(state.apis.is_empty());
        assert!(state.distributions.is_empty());
    }

    #[tokio::test]
    async fn test_should_provision_independent_copies_on_reapply() {
        let dir = tempfile::tempdir().unwrap();
        let cloud = LocalCloud::new(config(dir.path()));
        let (_, first) = deploy(&cloud).await;
        let (_, second) = deploy(&cloud).await;

        assert_ne!(first[exports::BUCKET_NAME], second[exports::BUCKET_NAME]);
        assert_ne!(first[exports::API_ENDPOINT], second[exports::API_ENDPOINT]);
        assert_eq!(cloud.store().bucket_names().len(), 4);
    }

    #[tokio::test]
    async fn test_should_deprovision_role_policy_idempotently() {
        let cloud = LocalCloud::new(StackConfig::default());
        let role_id = LogicalId::new("ApiRole").unwrap();
        let role_spec = ResolvedSpec::Role {
            assumed_by: "lambda.amazonaws.com".to_owned(),
        };
        let role = cloud.provision(&role_id, &role_spec).await.unwrap();
        let role_name = role.get(Attribute::Name).unwrap().to_owned();
        let policy = ResolvedSpec::RolePolicy {
            role: role_name.clone(),
            statements: vec![photostack_stack::ResolvedStatement {
                principal: None,
                resource: Arn::s3_bucket("photos"),
                actions: [photostack_stack::S3Action::ListBucket].into(),
            }],
        };
        let policy_id = LogicalId::new("ApiRolePolicy").unwrap();
        let policy_outputs = cloud.provision(&policy_id, &policy).await.unwrap();
        assert_eq!(cloud.state().role(&role_name).unwrap().statements.len(), 1);

        cloud
            .deprovision(&policy_id, &policy, &policy_outputs)
            .await
            .unwrap();
        assert!(cloud.state().role(&role_name).unwrap().statements.is_empty());

        cloud.deprovision(&role_id, &role_spec, &role).await.unwrap();
        assert!(cloud.state().roles.is_empty());
        // Removing twice is harmless.
        cloud
            .deprovision(&policy_id, &policy, &policy_outputs)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_should_fail_invoking_unknown_function() {
        let cloud = LocalCloud::new(StackConfig::default());
        assert!(matches!(
            cloud.invoke("missing").await,
            Err(LocalError::NoSuchFunction(_))
        ));
    }

    #[tokio::test]
    async fn test_should_reject_policy_on_missing_bucket() {
        let cloud = LocalCloud::new(StackConfig::default());
        let id = LogicalId::new("SitePolicy").unwrap();
        let err = cloud
            .provision(
                &id,
                &ResolvedSpec::BucketPolicy {
                    bucket: "missing-bucket".to_owned(),
                    statements: Vec::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.message.contains("missing-bucket"));
    }

    #[test]
    fn test_should_generate_valid_bucket_names() {
        let config = StackConfig::builder()
            .stack_name("A".repeat(70))
            .build();
        let cloud = LocalCloud::new(config);
        let name = cloud.bucket_name(&LogicalId::new("PhotoBucket").unwrap());
        assert!(name.len() <= MAX_BUCKET_NAME_LEN);
        assert!(photostack_storage::validation::validate_bucket_name(&name).is_ok());
    }
}
