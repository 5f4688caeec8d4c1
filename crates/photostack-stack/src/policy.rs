//! Least-privilege S3 access statements.
//!
//! Only three actions can be expressed: [`S3Action::ListBucket`] on a bucket
//! ARN and [`S3Action::GetObject`] / [`S3Action::PutObject`] on the bucket's
//! objects. There is no wildcard variant, and parsing rejects `*`, `s3:*` and
//! any other pattern.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use photostack_core::Arn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::reference::{Attribute, LogicalId, Reference};

/// An allowed S3 action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum S3Action {
    /// `s3:ListBucket`, granted on the bucket itself.
    #[serde(rename = "s3:ListBucket")]
    ListBucket,
    /// `s3:GetObject`, granted on bucket contents.
    #[serde(rename = "s3:GetObject")]
    GetObject,
    /// `s3:PutObject`, granted on bucket contents.
    #[serde(rename = "s3:PutObject")]
    PutObject,
}

impl S3Action {
    /// Every action in the allow-list.
    pub const ALL: [Self; 3] = [Self::ListBucket, Self::GetObject, Self::PutObject];

    /// The IAM action string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListBucket => "s3:ListBucket",
            Self::GetObject => "s3:GetObject",
            Self::PutObject => "s3:PutObject",
        }
    }

    /// The only resource scope this action may be granted on.
    #[must_use]
    pub fn scope(self) -> PolicyScope {
        match self {
            Self::ListBucket => PolicyScope::Bucket,
            Self::GetObject | Self::PutObject => PolicyScope::Objects,
        }
    }
}

impl fmt::Display for S3Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for S3Action {
    type Err = ConfigurationError;

    /// Accepts `s3:ListBucket` or the bare `ListBucket` (same for the others).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix("s3:").unwrap_or(s);
        match name {
            "ListBucket" => Ok(Self::ListBucket),
            "GetObject" => Ok(Self::GetObject),
            "PutObject" => Ok(Self::PutObject),
            _ => Err(ConfigurationError::UnknownAction(s.to_owned())),
        }
    }
}

/// What part of a bucket a statement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyScope {
    /// The bucket ARN itself.
    Bucket,
    /// Every object in the bucket (`<bucket-arn>/*`).
    Objects,
}

impl fmt::Display for PolicyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bucket => f.write_str("the bucket ARN"),
            Self::Objects => f.write_str("the bucket's objects"),
        }
    }
}

/// The resource a statement applies to: a bucket, or its objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyResource {
    /// Reference to the bucket's ARN.
    pub bucket: Reference,
    /// Bucket or object scope.
    pub scope: PolicyScope,
}

impl PolicyResource {
    /// The bucket ARN.
    #[must_use]
    pub fn bucket(bucket: &LogicalId) -> Self {
        Self {
            bucket: bucket.attr(Attribute::Arn),
            scope: PolicyScope::Bucket,
        }
    }

    /// All objects in the bucket.
    #[must_use]
    pub fn objects(bucket: &LogicalId) -> Self {
        Self {
            bucket: bucket.attr(Attribute::Arn),
            scope: PolicyScope::Objects,
        }
    }

    /// Render the concrete resource pattern for a resolved bucket ARN.
    #[must_use]
    pub fn pattern(&self, bucket_arn: &str) -> Arn {
        let arn = Arn::from_raw(bucket_arn);
        match self.scope {
            PolicyScope::Bucket => arn,
            PolicyScope::Objects => Arn::from_raw(format!("{arn}/*")),
        }
    }
}

/// An `Allow` statement over one bucket resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    /// Grantee, for resource-based policies. `None` in identity policies.
    pub principal: Option<Reference>,
    /// The bucket or object pattern.
    pub resource: PolicyResource,
    /// Granted actions.
    pub actions: BTreeSet<S3Action>,
}

impl PolicyStatement {
    /// Build a statement, checking every action against the resource scope.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EmptyStatement`] when `actions` is empty
    /// and [`ConfigurationError::InvalidPolicyScope`] when an action does not
    /// belong on the given scope.
    pub fn new(
        resource: PolicyResource,
        actions: impl IntoIterator<Item = S3Action>,
    ) -> Result<Self, ConfigurationError> {
        let actions: BTreeSet<S3Action> = actions.into_iter().collect();
        if actions.is_empty() {
            return Err(ConfigurationError::EmptyStatement(resource.bucket.node));
        }
        if let Some(action) = actions.iter().find(|a| a.scope() != resource.scope) {
            return Err(ConfigurationError::InvalidPolicyScope {
                action: *action,
                scope: resource.scope,
            });
        }
        Ok(Self {
            principal: None,
            resource,
            actions,
        })
    }

    /// Attach a grantee.
    #[must_use]
    pub fn with_principal(mut self, principal: Reference) -> Self {
        self.principal = Some(principal);
        self
    }

    /// References this statement depends on.
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        std::iter::once(&self.resource.bucket).chain(self.principal.iter())
    }
}

/// A statement with every reference replaced by its provisioned value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStatement {
    /// Grantee ARN, if any.
    pub principal: Option<String>,
    /// Concrete resource pattern.
    pub resource: Arn,
    /// Granted actions.
    pub actions: BTreeSet<S3Action>,
}

impl ResolvedStatement {
    /// Whether this statement grants `action` on `resource`.
    #[must_use]
    pub fn allows(&self, action: S3Action, resource: &str) -> bool {
        self.actions.contains(&action) && self.resource.matches(resource)
    }

    /// Whether this statement grants `action` on `resource` to `principal`.
    #[must_use]
    pub fn allows_principal(&self, principal: &str, action: S3Action, resource: &str) -> bool {
        self.principal.as_deref() == Some(principal) && self.allows(action, resource)
    }
}
