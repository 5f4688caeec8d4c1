//! Dependency graph and apply ordering.

use std::collections::{BTreeSet, HashMap};

use crate::error::ConfigurationError;
use crate::reference::LogicalId;

/// Directed dependency graph over declared nodes.
///
/// Nodes keep their declaration index so that ordering is deterministic:
/// among nodes whose dependencies are all satisfied, the one declared first
/// is applied first.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<LogicalId>,
    index: HashMap<LogicalId, usize>,
    /// node index -> indices of nodes that depend on it.
    dependents: Vec<Vec<usize>>,
    /// node index -> indices of nodes it depends on.
    dependencies: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Adding an existing node is a no-op.
    pub fn add_node(&mut self, id: &LogicalId) {
        if self.index.contains_key(id) {
            return;
        }
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(id.clone());
        self.dependents.push(Vec::new());
        self.dependencies.push(Vec::new());
    }

    /// Record that `node` depends on `dependency`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UndeclaredNode`] if either end is unknown.
    pub fn add_edge(
        &mut self,
        node: &LogicalId,
        dependency: &LogicalId,
    ) -> Result<(), ConfigurationError> {
        let from = self.position(node)?;
        let to = self.position(dependency)?;
        if !self.dependencies[from].contains(&to) {
            self.dependencies[from].push(to);
            self.dependents[to].push(from);
        }
        Ok(())
    }

    /// Nodes `id` depends on directly.
    #[must_use]
    pub fn dependencies_of(&self, id: &LogicalId) -> Vec<&LogicalId> {
        self.index
            .get(id)
            .map(|&i| self.dependencies[i].iter().map(|&d| &self.nodes[d]).collect())
            .unwrap_or_default()
    }

    /// Topological order (Kahn), declaration order breaking ties.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Cycle`] naming the nodes left unordered.
    pub fn topological_order(&self) -> Result<Vec<LogicalId>, ConfigurationError> {
        let mut in_degree: Vec<usize> = self.dependencies.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(next) = ready.pop_first() {
            order.push(self.nodes[next].clone());
            for &dependent in &self.dependents[next] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            let stuck = in_degree
                .iter()
                .enumerate()
                .filter(|(_, d)| **d > 0)
                .map(|(i, _)| self.nodes[i].clone())
                .collect();
            Err(ConfigurationError::Cycle(stuck))
        }
    }

    fn position(&self, id: &LogicalId) -> Result<usize, ConfigurationError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| ConfigurationError::UndeclaredNode(id.clone()))
    }
}
