//! Records of everything the local cloud has created.
//!
//! Each service keeps its records in a `DashMap`. Lookups clone the record
//! out so no map guard is held across an `.await`.

use std::collections::BTreeMap;

use dashmap::DashMap;
use http::Method;
use photostack_stack::{CorsPolicy, ResolvedStatement};
use photostack_storage::ObjectStore;

use crate::error::{LocalError, LocalResult};

/// An execution role and its inline policy statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    /// Role name.
    pub name: String,
    /// Role ARN.
    pub arn: String,
    /// Service principal allowed to assume the role.
    pub assumed_by: String,
    /// Statements attached through role policies.
    pub statements: Vec<ResolvedStatement>,
}

/// A deployed function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    /// Function name.
    pub name: String,
    /// Function ARN.
    pub arn: String,
    /// Registered handler name.
    pub handler: String,
    /// Runtime identifier.
    pub runtime: String,
    /// Source entry point.
    pub entry_point: String,
    /// Name of the execution role.
    pub role_name: String,
    /// Environment passed to each invocation.
    pub env: BTreeMap<String, String>,
}

/// A route on an HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    /// Route id.
    pub id: String,
    /// Method matched.
    pub method: Method,
    /// Path matched, starting with `/`.
    pub path: String,
    /// Target function name.
    pub function_name: String,
}

/// An HTTP API with its default stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRecord {
    /// API id.
    pub id: String,
    /// API name.
    pub name: String,
    /// Cross-origin policy.
    pub cors: CorsPolicy,
    /// Routes, in creation order.
    pub routes: Vec<RouteRecord>,
}

impl ApiRecord {
    /// The route bound to `method` and `path`.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<&RouteRecord> {
        self.routes
            .iter()
            .find(|r| &r.method == method && r.path == path)
    }
}

/// A CDN read identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    /// Identity id.
    pub id: String,
    /// Free-form comment.
    pub comment: String,
}

/// A CDN distribution fronting one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionRecord {
    /// Distribution id.
    pub id: String,
    /// Origin bucket.
    pub bucket: String,
    /// Identity the distribution reads the origin as.
    pub identity_id: String,
    /// Object served for `/`.
    pub default_root_object: String,
}

/// Everything provisioned so far.
#[derive(Debug, Default)]
pub struct CloudState {
    /// Buckets and objects.
    pub store: ObjectStore,
    /// Roles by name.
    pub roles: DashMap<String, RoleRecord>,
    /// Functions by name.
    pub functions: DashMap<String, FunctionRecord>,
    /// HTTP APIs by id.
    pub apis: DashMap<String, ApiRecord>,
    /// Read identities by id.
    pub identities: DashMap<String, IdentityRecord>,
    /// Resource policies by bucket name.
    pub bucket_policies: DashMap<String, Vec<ResolvedStatement>>,
    /// Distributions by id.
    pub distributions: DashMap<String, DistributionRecord>,
}

impl CloudState {
    /// Look up a role by ARN.
    pub fn role_by_arn(&self, arn: &str) -> LocalResult<RoleRecord> {
        self.roles
            .iter()
            .find(|r| r.arn == arn)
            .map(|r| r.value().clone())
            .ok_or_else(|| LocalError::NoSuchRole(arn.to_owned()))
    }

    /// Look up a role by name.
    pub fn role(&self, name: &str) -> LocalResult<RoleRecord> {
        self.roles
            .get(name)
            .map(|r| r.value().clone())
            .ok_or_else(|| LocalError::NoSuchRole(name.to_owned()))
    }

    /// Look up a function by name.
    pub fn function(&self, name: &str) -> LocalResult<FunctionRecord> {
        self.functions
            .get(name)
            .map(|f| f.value().clone())
            .ok_or_else(|| LocalError::NoSuchFunction(name.to_owned()))
    }

    /// Look up a function by ARN.
    pub fn function_by_arn(&self, arn: &str) -> LocalResult<FunctionRecord> {
        self.functions
            .iter()
            .find(|f| f.arn == arn)
            .map(|f| f.value().clone())
            .ok_or_else(|| LocalError::NoSuchFunction(arn.to_owned()))
    }

    /// Look up an HTTP API by id.
    pub fn api(&self, id: &str) -> LocalResult<ApiRecord> {
        self.apis
            .get(id)
            .map(|a| a.value().clone())
            .ok_or_else(|| LocalError::NoSuchApi(id.to_owned()))
    }

    /// Look up a distribution by id.
    pub fn distribution(&self, id: &str) -> LocalResult<DistributionRecord> {
        self.distributions
            .get(id)
            .map(|d| d.value().clone())
            .ok_or_else(|| LocalError::NoSuchDistribution(id.to_owned()))
    }

    /// The resource policy on `bucket`; empty when none is attached.
    #[must_use]
    pub fn bucket_policy(&self, bucket: &str) -> Vec<ResolvedStatement> {
        self.bucket_policies
            .get(bucket)
            .map(|p| p.value().clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_find_role_by_arn() {
        let state = CloudState::default();
        state.roles.insert(
            "ApiRole".to_owned(),
            RoleRecord {
                name: "ApiRole".to_owned(),
                arn: "arn:aws:iam::000000000000:role/ApiRole".to_owned(),
                assumed_by: "lambda.amazonaws.com".to_owned(),
                statements: Vec::new(),
            },
        );
        assert_eq!(
            state
                .role_by_arn("arn:aws:iam::000000000000:role/ApiRole")
                .unwrap()
                .name,
            "ApiRole"
        );
        assert!(matches!(
            state.role_by_arn("arn:aws:iam::000000000000:role/Other"),
            Err(LocalError::NoSuchRole(_))
        ));
    }

    #[test]
    fn test_should_match_route_by_method_and_path() {
        let api = ApiRecord {
            id: "abc".to_owned(),
            name: "photo-api".to_owned(),
            cors: CorsPolicy::any_origin([Method::GET]),
            routes: vec![RouteRecord {
                id: "r1".to_owned(),
                method: Method::GET,
                path: "/getAllPhotos".to_owned(),
                function_name: "GetPhotos".to_owned(),
            }],
        };
        assert!(api.route(&Method::GET, "/getAllPhotos").is_some());
        assert!(api.route(&Method::POST, "/getAllPhotos").is_none());
        assert!(api.route(&Method::GET, "/other").is_none());
    }

    #[test]
    fn test_should_default_to_empty_bucket_policy() {
        let state = CloudState::default();
        assert!(state.bucket_policy("missing").is_empty());
    }
}
