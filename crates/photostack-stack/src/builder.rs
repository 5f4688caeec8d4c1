//! Declarative construction of the resource graph.
//!
//! Every declare call validates its inputs against what has already been
//! declared and fails fast with a [`ConfigurationError`]; nothing touches a
//! backend until [`crate::Stack::apply`].

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use http::Method;
use photostack_core::StackConfig;
use tracing::debug;

use crate::error::ConfigurationError;
use crate::graph::DependencyGraph;
use crate::outputs::Export;
use crate::policy::{PolicyResource, PolicyStatement, S3Action};
use crate::reference::{Attribute, LogicalId, Reference};
use crate::resource::{
    BucketOptions, CorsPolicy, EnvValue, FunctionConfig, PublicAccess, ResourceConfig,
    ResourceKind, ResourceNode,
};
use crate::stack::Stack;

/// Runtime recorded on declared functions.
pub const FUNCTION_RUNTIME: &str = "provided.al2023";

/// Service principal trusted by function execution roles.
pub const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";

/// Comment recorded on generated origin access identities.
pub const IDENTITY_COMMENT: &str = "Created by PhotoStack";

/// Collects resource declarations for one stack.
#[derive(Debug)]
pub struct StackBuilder<'a> {
    config: &'a StackConfig,
    nodes: Vec<ResourceNode>,
    index: HashMap<LogicalId, usize>,
    exports: Vec<Export>,
    api: Option<LogicalId>,
}

impl<'a> StackBuilder<'a> {
    /// Start an empty stack for `config`.
    #[must_use]
    pub fn new(config: &'a StackConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            index: HashMap::new(),
            exports: Vec::new(),
            api: None,
        }
    }

    /// The configuration this stack is built from.
    #[must_use]
    pub fn config(&self) -> &StackConfig {
        self.config
    }

    /// The HTTP API, once a route has declared it.
    #[must_use]
    pub fn http_api(&self) -> Option<&LogicalId> {
        self.api.as_ref()
    }

    /// Declare a bucket.
    pub fn declare_bucket(
        &mut self,
        name: &str,
        options: BucketOptions,
    ) -> Result<LogicalId, ConfigurationError> {
        let id = LogicalId::new(name)?;
        self.insert(id.clone(), ResourceConfig::Bucket(options))?;
        Ok(id)
    }

    /// Declare a one-shot upload of `source_dir` into `bucket`.
    ///
    /// The source must exist and be a directory now, not at apply time.
    pub fn declare_deployment(
        &mut self,
        source_dir: impl AsRef<Path>,
        bucket: &LogicalId,
    ) -> Result<LogicalId, ConfigurationError> {
        self.expect_kind(bucket, ResourceKind::Bucket)?;
        let source = source_dir.as_ref();
        if !source.is_dir() {
            return Err(ConfigurationError::MissingSource(source.to_path_buf()));
        }

        let id = self.unique_id(&format!("{bucket}Deployment"))?;
        self.insert(
            id.clone(),
            ResourceConfig::BucketDeployment {
                source: source.to_path_buf(),
                bucket: bucket.attr(Attribute::Name),
            },
        )?;
        Ok(id)
    }

    /// Declare a function and its execution role.
    ///
    /// `env` values may be literals or references to other nodes' outputs.
    pub fn declare_function<K, V>(
        &mut self,
        name: &str,
        entry_point: &str,
        handler: &str,
        env: impl IntoIterator<Item = (K, V)>,
    ) -> Result<LogicalId, ConfigurationError>
    where
        K: Into<String>,
        V: Into<EnvValue>,
    {
        let id = LogicalId::new(name)?;
        if self.index.contains_key(&id) {
            return Err(ConfigurationError::DuplicateLogicalId(id));
        }

        let env: BTreeMap<String, EnvValue> =
            env.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        for value in env.values() {
            if let EnvValue::Ref(reference) = value {
                self.check_reference(reference)?;
            }
        }

        let role = LogicalId::new(format!("{id}ServiceRole"))?;
        self.insert(
            role.clone(),
            ResourceConfig::Role {
                assumed_by: LAMBDA_SERVICE_PRINCIPAL.to_owned(),
            },
        )?;
        self.insert(
            id.clone(),
            ResourceConfig::Function(FunctionConfig {
                entry_point: entry_point.to_owned(),
                handler: handler.to_owned(),
                runtime: FUNCTION_RUNTIME.to_owned(),
                role: role.attr(Attribute::Arn),
                policy: None,
                env,
            }),
        )?;
        Ok(id)
    }

    /// Attach a statement to `function`'s execution role policy.
    ///
    /// Returns the role policy's logical ID. The first statement creates the
    /// policy node, and the function then depends on it.
    pub fn declare_policy(
        &mut self,
        function: &LogicalId,
        resource: PolicyResource,
        actions: impl IntoIterator<Item = S3Action>,
    ) -> Result<LogicalId, ConfigurationError> {
        let role = match &self.expect_kind(function, ResourceKind::Function)?.config {
            ResourceConfig::Function(f) => f.role.node.clone(),
            _ => unreachable!("kind checked above"),
        };
        self.expect_kind(&resource.bucket.node, ResourceKind::Bucket)?;
        let statement = PolicyStatement::new(resource, actions)?;

        let policy = LogicalId::new(format!("{role}DefaultPolicy"))?;
        if let Some(&i) = self.index.get(&policy) {
            if let ResourceConfig::RolePolicy { statements, .. } = &mut self.nodes[i].config {
                statements.push(statement);
            }
        } else {
            self.insert(
                policy.clone(),
                ResourceConfig::RolePolicy {
                    role: role.attr(Attribute::Name),
                    statements: vec![statement],
                },
            )?;
            let i = self.index[function];
            if let ResourceConfig::Function(f) = &mut self.nodes[i].config {
                f.policy = Some(policy.attr(Attribute::Name));
            }
        }
        debug!(function = %function, policy = %policy, "attached policy statement");
        Ok(policy)
    }

    /// Bind `method path` on the stack's HTTP API to `function`.
    ///
    /// The API is declared on first use, named from the configuration, with
    /// any-origin `GET` CORS and a default stage.
    pub fn declare_route(
        &mut self,
        path: &str,
        method: Method,
        function: &LogicalId,
    ) -> Result<LogicalId, ConfigurationError> {
        self.expect_kind(function, ResourceKind::Function)?;
        if !path.starts_with('/') {
            return Err(ConfigurationError::InvalidRoutePath(path.to_owned()));
        }

        let api = self.ensure_api()?;
        let method_name = LogicalId::pascal(&method.as_str().to_ascii_lowercase())?;
        let path_name = LogicalId::pascal(path).map_or_else(|_| "Root".to_owned(), |p| p.to_string());
        let id = LogicalId::new(format!("{api}{method_name}{path_name}Route"))?;
        self.insert(
            id.clone(),
            ResourceConfig::Route {
                api: api.attr(Attribute::Id),
                method,
                path: path.to_owned(),
                function: function.attr(Attribute::Arn),
            },
        )?;
        Ok(id)
    }

    /// Serve `bucket` through a CDN distribution.
    ///
    /// Declares a read identity, a bucket policy granting that identity
    /// `s3:GetObject` on the bucket's objects, and the distribution. The
    /// bucket must block all public access.
    pub fn declare_distribution(
        &mut self,
        bucket: &LogicalId,
    ) -> Result<LogicalId, ConfigurationError> {
        let index_document = match &self.expect_kind(bucket, ResourceKind::Bucket)?.config {
            ResourceConfig::Bucket(options) => {
                if options.public_access != PublicAccess::BlockAll {
                    return Err(ConfigurationError::PublicOrigin(bucket.clone()));
                }
                options
                    .index_document
                    .clone()
                    .unwrap_or_else(|| "index.html".to_owned())
            }
            _ => unreachable!("kind checked above"),
        };

        let identity = LogicalId::new(format!("{bucket}OriginAccessIdentity"))?;
        let policy = LogicalId::new(format!("{bucket}Policy"))?;
        let distribution = LogicalId::new(format!("{bucket}Distribution"))?;
        for id in [&identity, &policy, &distribution] {
            if self.index.contains_key(id) {
                return Err(ConfigurationError::DuplicateLogicalId(id.clone()));
            }
        }

        self.insert(
            identity.clone(),
            ResourceConfig::OriginAccessIdentity {
                comment: IDENTITY_COMMENT.to_owned(),
            },
        )?;
        let statement =
            PolicyStatement::new(PolicyResource::objects(bucket), [S3Action::GetObject])?
                .with_principal(identity.attr(Attribute::Id));
        self.insert(
            policy.clone(),
            ResourceConfig::BucketPolicy {
                bucket: bucket.attr(Attribute::Name),
                statements: vec![statement],
            },
        )?;
        self.insert(
            distribution.clone(),
            ResourceConfig::Distribution {
                bucket: bucket.attr(Attribute::Name),
                identity: identity.attr(Attribute::Id),
                policy: policy.attr(Attribute::Id),
                default_root_object: index_document,
            },
        )?;
        Ok(distribution)
    }

    /// Register a named export of another node's output.
    pub fn declare_export(
        &mut self,
        name: &str,
        value: Reference,
    ) -> Result<(), ConfigurationError> {
        self.check_reference(&value)?;
        if self.exports.iter().any(|e| e.name == name) {
            return Err(ConfigurationError::DuplicateExport(name.to_owned()));
        }
        self.exports.push(Export {
            name: name.to_owned(),
            value,
        });
        Ok(())
    }

    /// Validate the graph and fix its apply order.
    pub fn build(self) -> Result<Stack, ConfigurationError> {
        let mut graph = DependencyGraph::new();
        for node in &self.nodes {
            graph.add_node(&node.id);
        }
        for node in &self.nodes {
            for dependency in node.dependencies() {
                graph.add_edge(&node.id, &dependency)?;
            }
        }
        let order = graph.topological_order()?;
        debug!(
            stack = %self.config.stack_name,
            nodes = self.nodes.len(),
            exports = self.exports.len(),
            "built resource graph"
        );
        Ok(Stack::new(
            self.config.stack_name.clone(),
            self.nodes,
            graph,
            order,
            self.exports,
        ))
    }

    fn ensure_api(&mut self) -> Result<LogicalId, ConfigurationError> {
        if let Some(api) = &self.api {
            return Ok(api.clone());
        }
        let api = LogicalId::pascal(&self.config.api_name)?;
        self.insert(
            api.clone(),
            ResourceConfig::HttpApi {
                name: self.config.api_name.clone(),
                cors: CorsPolicy::any_origin([Method::GET]),
            },
        )?;
        self.api = Some(api.clone());
        Ok(api)
    }

    fn insert(&mut self, id: LogicalId, config: ResourceConfig) -> Result<(), ConfigurationError> {
        if self.index.contains_key(&id) {
            return Err(ConfigurationError::DuplicateLogicalId(id));
        }
        debug!(logical_id = %id, kind = %config.kind(), "declared resource");
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(ResourceNode { id, config });
        Ok(())
    }

    fn node(&self, id: &LogicalId) -> Result<&ResourceNode, ConfigurationError> {
        self.index
            .get(id)
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| ConfigurationError::UndeclaredNode(id.clone()))
    }

    fn expect_kind(
        &self,
        id: &LogicalId,
        expected: ResourceKind,
    ) -> Result<&ResourceNode, ConfigurationError> {
        let node = self.node(id)?;
        if node.kind() == expected {
            Ok(node)
        } else {
            Err(ConfigurationError::KindMismatch {
                id: id.clone(),
                expected,
                actual: node.kind(),
            })
        }
    }

    fn check_reference(&self, reference: &Reference) -> Result<(), ConfigurationError> {
        let kind = self.node(&reference.node)?.kind();
        if kind.attributes().contains(&reference.attribute) {
            Ok(())
        } else {
            Err(ConfigurationError::UnknownAttribute {
                id: reference.node.clone(),
                kind,
                attribute: reference.attribute,
            })
        }
    }

    fn unique_id(&self, base: &str) -> Result<LogicalId, ConfigurationError> {
        let mut candidate = LogicalId::new(base)?;
        let mut n = 2;
        while self.index.contains_key(&candidate) {
            candidate = LogicalId::new(format!("{base}{n}"))?;
            n += 1;
        }
        Ok(candidate)
    }
}
