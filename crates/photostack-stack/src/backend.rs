//! The provisioning backend seam.
//!
//! A backend receives each node with every reference already replaced by the
//! concrete value its dependency reported, and answers with the node's own
//! outputs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use http::Method;

use crate::error::StackResult;
use crate::outputs::{Deployed, ResourceOutputs};
use crate::policy::{PolicyStatement, ResolvedStatement};
use crate::reference::{LogicalId, Reference};
use crate::resource::{BucketOptions, CorsPolicy, EnvValue, ResourceConfig};

/// A backend rejected a resource. The message is surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    /// Human-readable reason.
    pub message: String,
}

impl BackendError {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reconciles one resource at a time.
#[async_trait]
pub trait ProvisioningBackend: Send + Sync {
    /// Create the resource and return its outputs.
    async fn provision(
        &self,
        logical_id: &LogicalId,
        spec: &ResolvedSpec,
    ) -> Result<ResourceOutputs, BackendError>;

    /// Remove a resource this backend provisioned from `spec`, which
    /// reported `outputs`. Removing something already gone is not an error.
    async fn deprovision(
        &self,
        logical_id: &LogicalId,
        spec: &ResolvedSpec,
        outputs: &ResourceOutputs,
    ) -> Result<(), BackendError>;
}

/// A node's configuration with references resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSpec {
    /// A bucket.
    Bucket(BucketOptions),
    /// Upload `source` into `bucket`.
    BucketDeployment {
        /// Local directory.
        source: PathBuf,
        /// Physical bucket name.
        bucket: String,
    },
    /// A CDN read identity.
    OriginAccessIdentity {
        /// Free-form comment.
        comment: String,
    },
    /// Resource policy on a bucket.
    BucketPolicy {
        /// Physical bucket name.
        bucket: String,
        /// Statements with principals.
        statements: Vec<ResolvedStatement>,
    },
    /// An execution role.
    Role {
        /// Service principal allowed to assume it.
        assumed_by: String,
    },
    /// Inline policy on a role.
    RolePolicy {
        /// Role name.
        role: String,
        /// Identity statements.
        statements: Vec<ResolvedStatement>,
    },
    /// A function.
    Function {
        /// Source entry point.
        entry_point: String,
        /// Handler name.
        handler: String,
        /// Runtime identifier.
        runtime: String,
        /// Execution role ARN.
        role_arn: String,
        /// Environment.
        env: BTreeMap<String, String>,
    },
    /// An HTTP API.
    HttpApi {
        /// API name.
        name: String,
        /// Cross-origin policy.
        cors: CorsPolicy,
    },
    /// A route.
    Route {
        /// API id.
        api_id: String,
        /// HTTP method.
        method: Method,
        /// Path.
        path: String,
        /// Target function ARN.
        function_arn: String,
    },
    /// A CDN distribution.
    Distribution {
        /// Origin bucket name.
        bucket: String,
        /// Read identity id.
        identity_id: String,
        /// Object served for `/`.
        default_root_object: String,
    },
}

fn resolve_statements(
    statements: &[PolicyStatement],
    deployed: &Deployed,
) -> StackResult<Vec<ResolvedStatement>> {
    statements
        .iter()
        .map(|s| {
            Ok(ResolvedStatement {
                principal: s
                    .principal
                    .as_ref()
                    .map(|p| deployed.resolve(p).map(ToOwned::to_owned))
                    .transpose()?,
                resource: s.resource.pattern(deployed.resolve(&s.resource.bucket)?),
                actions: s.actions.clone(),
            })
        })
        .collect()
}

impl ResolvedSpec {
    /// Resolve every reference in `config` against what has been provisioned.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StackError::NotProvisioned`] if a dependency has not
    /// run yet, or [`crate::StackError::MissingOutput`] if it did not report
    /// the referenced attribute.
    pub fn resolve(config: &ResourceConfig, deployed: &Deployed) -> StackResult<Self> {
        let value = |r: &Reference| -> StackResult<String> {
            deployed.resolve(r).map(ToOwned::to_owned)
        };
        Ok(match config {
            ResourceConfig::Bucket(options) => Self::Bucket(options.clone()),
            ResourceConfig::BucketDeployment { source, bucket } => Self::BucketDeployment {
                source: source.clone(),
                bucket: value(bucket)?,
            },
            ResourceConfig::OriginAccessIdentity { comment } => Self::OriginAccessIdentity {
                comment: comment.clone(),
            },
            ResourceConfig::BucketPolicy { bucket, statements } => Self::BucketPolicy {
                bucket: value(bucket)?,
                statements: resolve_statements(statements, deployed)?,
            },
            ResourceConfig::Role { assumed_by } => Self::Role {
                assumed_by: assumed_by.clone(),
            },
            ResourceConfig::RolePolicy { role, statements } => Self::RolePolicy {
                role: value(role)?,
                statements: resolve_statements(statements, deployed)?,
            },
            ResourceConfig::Function(function) => {
                let env = function
                    .env
                    .iter()
                    .map(|(k, v)| {
                        let resolved = match v {
                            EnvValue::Literal(s) => s.clone(),
                            EnvValue::Ref(r) => value(r)?,
                        };
                        Ok((k.clone(), resolved))
                    })
                    .collect::<StackResult<BTreeMap<_, _>>>()?;
                Self::Function {
                    entry_point: function.entry_point.clone(),
                    handler: function.handler.clone(),
                    runtime: function.runtime.clone(),
                    role_arn: value(&function.role)?,
                    env,
                }
            }
            ResourceConfig::HttpApi { name, cors } => Self::HttpApi {
                name: name.clone(),
                cors: cors.clone(),
            },
            ResourceConfig::Route {
                api,
                method,
                path,
                function,
            } => Self::Route {
                api_id: value(api)?,
                method: method.clone(),
                path: path.clone(),
                function_arn: value(function)?,
            },
            ResourceConfig::Distribution {
                bucket,
                identity,
                default_root_object,
                ..
            } => Self::Distribution {
                bucket: value(bucket)?,
                identity_id: value(identity)?,
                default_root_object: default_root_object.clone(),
            },
        })
    }
}
