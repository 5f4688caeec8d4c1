//! A validated stack and its apply loop.

use std::collections::HashMap;

use photostack_storage::DeploymentManifest;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{ProvisioningBackend, ResolvedSpec};
use crate::error::{StackError, StackResult};
use crate::graph::DependencyGraph;
use crate::outputs::{Deployed, Export, ResourceOutputs, StackOutputs};
use crate::reference::LogicalId;
use crate::resource::{ResourceConfig, ResourceKind, ResourceNode};

/// A node the backend has created during the current apply.
type AppliedNode = (LogicalId, ResolvedSpec, ResourceOutputs);

/// One line of an apply plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    /// 1-based position in apply order.
    pub step: usize,
    /// The node.
    pub logical_id: LogicalId,
    /// Its kind.
    pub kind: ResourceKind,
    /// Direct dependencies.
    pub depends_on: Vec<LogicalId>,
}

/// A resource graph whose references are known to be well-formed and acyclic.
///
/// Built by [`crate::StackBuilder::build`].
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    nodes: Vec<ResourceNode>,
    index: HashMap<LogicalId, usize>,
    graph: DependencyGraph,
    order: Vec<LogicalId>,
    exports: Vec<Export>,
}

impl Stack {
    pub(crate) fn new(
        name: String,
        nodes: Vec<ResourceNode>,
        graph: DependencyGraph,
        order: Vec<LogicalId>,
        exports: Vec<Export>,
    ) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        Self {
            name,
            nodes,
            index,
            graph,
            order,
            exports,
        }
    }

    /// Stack name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nodes in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: &LogicalId) -> Option<&ResourceNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Apply order: every node after all of its dependencies.
    #[must_use]
    pub fn order(&self) -> &[LogicalId] {
        &self.order
    }

    /// Declared exports, in declaration order.
    #[must_use]
    pub fn exports(&self) -> &[Export] {
        &self.exports
    }

    /// Describe what [`Stack::apply`] will do, without doing it.
    #[must_use]
    pub fn plan(&self) -> Vec<PlanStep> {
        self.order
            .iter()
            .enumerate()
            .filter_map(|(i, id)| {
                let node = self.node(id)?;
                Some(PlanStep {
                    step: i + 1,
                    logical_id: id.clone(),
                    kind: node.kind(),
                    depends_on: self.graph.dependencies_of(id).into_iter().cloned().collect(),
                })
            })
            .collect()
    }

    /// Provision every node in order.
    ///
    /// Each node's references are resolved against the outputs of the nodes
    /// before it. The first failure aborts the run, and every node already
    /// provisioned is deprovisioned in reverse order before the error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Provisioning`] with the backend's message
    /// verbatim, or when a backend omits one of the outputs the node's kind
    /// promises.
    pub async fn apply(&self, backend: &dyn ProvisioningBackend) -> StackResult<Deployed> {
        let mut applied = Vec::new();
        match self.provision_all(backend, &mut applied).await {
            Ok(deployed) => {
                info!(stack = %self.name, resources = deployed.order().len(), "stack applied");
                Ok(deployed)
            }
            Err(err) => {
                Self::roll_back(backend, &applied).await;
                Err(err)
            }
        }
    }

    async fn provision_all(
        &self,
        backend: &dyn ProvisioningBackend,
        applied: &mut Vec<AppliedNode>,
    ) -> StackResult<Deployed> {
        let mut deployed = Deployed::new();
        for id in &self.order {
            let Some(node) = self.node(id) else {
                continue;
            };
            let spec = ResolvedSpec::resolve(&node.config, &deployed)?;
            info!(logical_id = %id, kind = %node.kind(), "provisioning resource");

            let outputs = backend.provision(id, &spec).await.map_err(|e| {
                warn!(logical_id = %id, error = %e, "provisioning failed");
                StackError::Provisioning {
                    logical_id: id.clone(),
                    message: e.message,
                }
            })?;
            applied.push((id.clone(), spec, outputs.clone()));

            for attribute in node.kind().attributes() {
                if outputs.get(*attribute).is_none_or(str::is_empty) {
                    return Err(StackError::Provisioning {
                        logical_id: id.clone(),
                        message: format!("backend reported no {attribute} output"),
                    });
                }
            }
            deployed.insert(id.clone(), outputs);
        }
        Ok(deployed)
    }

    /// Best effort: a resource that cannot be removed is logged and skipped.
    async fn roll_back(
        backend: &dyn ProvisioningBackend,
        applied: &[AppliedNode],
    ) {
        for (id, spec, outputs) in applied.iter().rev() {
            match backend.deprovision(id, spec, outputs).await {
                Ok(()) => debug!(logical_id = %id, "rolled back resource"),
                Err(e) => warn!(logical_id = %id, error = %e, "failed to roll back resource"),
            }
        }
        if !applied.is_empty() {
            info!(resources = applied.len(), "rolled back partial apply");
        }
    }

    /// Resolve every declared export against a completed apply.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::NotProvisioned`] or [`StackError::MissingOutput`]
    /// if an export's node did not produce a non-empty value.
    pub fn finalize_outputs(&self, deployed: &Deployed) -> StackResult<StackOutputs> {
        self.exports
            .iter()
            .map(|export| {
                let value = deployed.resolve(&export.value)?;
                if value.is_empty() {
                    return Err(StackError::MissingOutput {
                        logical_id: export.value.node.clone(),
                        attribute: export.value.attribute,
                    });
                }
                Ok((export.name.clone(), value.to_owned()))
            })
            .collect()
    }

    /// Every bucket deployment as a re-runnable sync manifest, with bucket
    /// names taken from a completed apply.
    ///
    /// # Errors
    ///
    /// Returns an error if a deployment's bucket was not provisioned.
    pub fn deployment_manifest(&self, deployed: &Deployed) -> StackResult<DeploymentManifest> {
        let mut manifest = DeploymentManifest::new();
        for id in &self.order {
            if let Some(ResourceNode {
                config: ResourceConfig::BucketDeployment { source, bucket },
                ..
            }) = self.node(id)
            {
                manifest.push(source.clone(), deployed.resolve(bucket)?);
            }
        }
        Ok(manifest)
    }
}
