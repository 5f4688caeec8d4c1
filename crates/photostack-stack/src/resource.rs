//! Resource nodes and their configuration records.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use http::Method;
use serde::Serialize;
use typed_builder::TypedBuilder;

use crate::policy::PolicyStatement;
use crate::reference::{Attribute, LogicalId, Reference};

/// The kind of a resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    /// Object storage bucket.
    Bucket,
    /// One-shot upload of a local directory into a bucket.
    BucketDeployment,
    /// CDN read identity.
    OriginAccessIdentity,
    /// Resource policy attached to a bucket.
    BucketPolicy,
    /// Function execution role.
    Role,
    /// Inline policy attached to a role.
    RolePolicy,
    /// Serverless function.
    Function,
    /// HTTP API with a default stage.
    HttpApi,
    /// Method + path bound to a function.
    Route,
    /// CDN distribution.
    Distribution,
}

impl ResourceKind {
    /// The outputs a provisioned node of this kind exposes.
    #[must_use]
    pub fn attributes(self) -> &'static [Attribute] {
        match self {
            Self::Bucket => &[Attribute::Name, Attribute::Arn, Attribute::DomainName],
            Self::BucketDeployment
            | Self::OriginAccessIdentity
            | Self::BucketPolicy
            | Self::Route => &[Attribute::Id],
            Self::Role | Self::Function => &[Attribute::Name, Attribute::Arn],
            Self::RolePolicy => &[Attribute::Name],
            Self::HttpApi => &[Attribute::Id, Attribute::Url],
            Self::Distribution => &[Attribute::Id, Attribute::DomainName, Attribute::Url],
        }
    }

    /// The CloudFormation resource type.
    #[must_use]
    pub fn cfn_type(self) -> &'static str {
        match self {
            Self::Bucket => "AWS::S3::Bucket",
            Self::BucketDeployment => "Custom::CDKBucketDeployment",
            Self::OriginAccessIdentity => "AWS::CloudFront::CloudFrontOriginAccessIdentity",
            Self::BucketPolicy => "AWS::S3::BucketPolicy",
            Self::Role => "AWS::IAM::Role",
            Self::RolePolicy => "AWS::IAM::Policy",
            Self::Function => "AWS::Lambda::Function",
            Self::HttpApi => "AWS::ApiGatewayV2::Api",
            Self::Route => "AWS::ApiGatewayV2::Route",
            Self::Distribution => "AWS::CloudFront::Distribution",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Server-side encryption at rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum BucketEncryption {
    /// Unencrypted.
    #[default]
    None,
    /// SSE-S3 with service-managed keys.
    S3Managed,
}

/// Public-access posture of a bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PublicAccess {
    /// Service defaults; policies and ACLs may open the bucket.
    #[default]
    Default,
    /// Every public-access block setting enabled.
    BlockAll,
}

/// What happens to the physical resource when it leaves the stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum RemovalPolicy {
    /// Keep the resource.
    #[default]
    Retain,
    /// Delete the resource.
    Destroy,
}

/// Options accepted by `declare_bucket`.
///
/// ```
/// use photostack_stack::{BucketEncryption, BucketOptions, PublicAccess};
///
/// let options = BucketOptions::builder()
///     .encryption(BucketEncryption::S3Managed)
///     .public_access(PublicAccess::BlockAll)
///     .versioned(true)
///     .index_document("index.html")
///     .build();
/// assert!(options.versioned);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TypedBuilder)]
pub struct BucketOptions {
    /// Encryption at rest.
    #[builder(default)]
    pub encryption: BucketEncryption,
    /// Keep every object version.
    #[builder(default)]
    pub versioned: bool,
    /// Public-access posture.
    #[builder(default)]
    pub public_access: PublicAccess,
    /// Website index document.
    #[builder(default, setter(strip_option, into))]
    pub index_document: Option<String>,
    /// Removal policy.
    #[builder(default)]
    pub removal_policy: RemovalPolicy,
}

/// Cross-origin policy of an HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    /// Allowed origins; `*` allows any.
    pub allow_origins: Vec<String>,
    /// Allowed methods.
    pub allow_methods: Vec<Method>,
}

impl CorsPolicy {
    /// Any origin, the given methods only.
    #[must_use]
    pub fn any_origin(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            allow_origins: vec!["*".to_owned()],
            allow_methods: methods.into_iter().collect(),
        }
    }
}

/// A function environment value: a literal, or another node's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    /// Fixed string.
    Literal(String),
    /// Resolved at apply time.
    Ref(Reference),
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_owned())
    }
}

impl From<Reference> for EnvValue {
    fn from(value: Reference) -> Self {
        Self::Ref(value)
    }
}

/// Configuration of a function node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionConfig {
    /// Source entry point, e.g. `api/get-photos`.
    pub entry_point: String,
    /// Exported handler name.
    pub handler: String,
    /// Runtime identifier.
    pub runtime: String,
    /// Execution role ARN.
    pub role: Reference,
    /// Role policy the function waits for, once a statement is attached.
    pub policy: Option<Reference>,
    /// Environment variables.
    pub env: BTreeMap<String, EnvValue>,
}

/// The configuration record of a node. Every [`Reference`] inside is a
/// dependency edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceConfig {
    /// A bucket.
    Bucket(BucketOptions),
    /// Upload `source` into the referenced bucket.
    BucketDeployment {
        /// Local directory.
        source: PathBuf,
        /// Destination bucket name.
        bucket: Reference,
    },
    /// A CDN read identity.
    OriginAccessIdentity {
        /// Free-form comment.
        comment: String,
    },
    /// Resource policy on a bucket.
    BucketPolicy {
        /// Bucket name.
        bucket: Reference,
        /// Statements, each with a principal.
        statements: Vec<PolicyStatement>,
    },
    /// Function execution role.
    Role {
        /// Service allowed to assume the role.
        assumed_by: String,
    },
    /// Inline role policy.
    RolePolicy {
        /// Role name.
        role: Reference,
        /// Identity statements.
        statements: Vec<PolicyStatement>,
    },
    /// A function.
    Function(FunctionConfig),
    /// An HTTP API.
    HttpApi {
        /// API name.
        name: String,
        /// Cross-origin policy.
        cors: CorsPolicy,
    },
    /// A route on an HTTP API.
    Route {
        /// API id.
        api: Reference,
        /// HTTP method.
        method: Method,
        /// Path, starting with `/`.
        path: String,
        /// Target function ARN.
        function: Reference,
    },
    /// A CDN distribution.
    Distribution {
        /// Origin bucket name.
        bucket: Reference,
        /// Read identity id.
        identity: Reference,
        /// Bucket policy granting the identity read access.
        policy: Reference,
        /// Object served for `/`.
        default_root_object: String,
    },
}

impl ResourceConfig {
    /// The kind of node this record configures.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Bucket(_) => ResourceKind::Bucket,
            Self::BucketDeployment { .. } => ResourceKind::BucketDeployment,
            Self::OriginAccessIdentity { .. } => ResourceKind::OriginAccessIdentity,
            Self::BucketPolicy { .. } => ResourceKind::BucketPolicy,
            Self::Role { .. } => ResourceKind::Role,
            Self::RolePolicy { .. } => ResourceKind::RolePolicy,
            Self::Function(_) => ResourceKind::Function,
            Self::HttpApi { .. } => ResourceKind::HttpApi,
            Self::Route { .. } => ResourceKind::Route,
            Self::Distribution { .. } => ResourceKind::Distribution,
        }
    }

    /// Every reference in this record, in field order.
    #[must_use]
    pub fn references(&self) -> Vec<&Reference> {
        match self {
            Self::Bucket(_) | Self::OriginAccessIdentity { .. } | Self::Role { .. } | Self::HttpApi { .. } => {
                Vec::new()
            }
            Self::BucketDeployment { bucket, .. } => vec![bucket],
            Self::BucketPolicy { bucket, statements } => std::iter::once(bucket)
                .chain(statements.iter().flat_map(PolicyStatement::references))
                .collect(),
            Self::RolePolicy { role, statements } => std::iter::once(role)
                .chain(statements.iter().flat_map(PolicyStatement::references))
                .collect(),
            Self::Function(function) => std::iter::once(&function.role)
                .chain(function.policy.iter())
                .chain(function.env.values().filter_map(|v| match v {
                    EnvValue::Ref(r) => Some(r),
                    EnvValue::Literal(_) => None,
                }))
                .collect(),
            Self::Route { api, function, .. } => vec![api, function],
            Self::Distribution {
                bucket,
                identity,
                policy,
                ..
            } => vec![bucket, identity, policy],
        }
    }
}

/// A declared resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    /// Logical ID.
    pub id: LogicalId,
    /// Configuration record.
    pub config: ResourceConfig,
}

impl ResourceNode {
    /// The node's kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.config.kind()
    }

    /// The distinct nodes this node depends on, in first-reference order.
    #[must_use]
    pub fn dependencies(&self) -> Vec<LogicalId> {
        let mut deps: Vec<LogicalId> = Vec::new();
        for reference in self.config.references() {
            if !deps.contains(&reference.node) {
                deps.push(reference.node.clone());
            }
        }
        deps
    }
}
