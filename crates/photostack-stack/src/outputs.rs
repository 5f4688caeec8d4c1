//! Provisioned outputs and named exports.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{StackError, StackResult};
use crate::reference::{Attribute, LogicalId, Reference};

/// The outputs one provisioned node reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceOutputs(BTreeMap<Attribute, String>);

impl ResourceOutputs {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an output.
    #[must_use]
    pub fn with(mut self, attribute: Attribute, value: impl Into<String>) -> Self {
        self.0.insert(attribute, value.into());
        self
    }

    /// Look up an output.
    #[must_use]
    pub fn get(&self, attribute: Attribute) -> Option<&str> {
        self.0.get(&attribute).map(String::as_str)
    }

    /// Iterate over every output.
    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &str)> {
        self.0.iter().map(|(a, v)| (*a, v.as_str()))
    }
}

/// Outputs of every node provisioned so far, in apply order.
///
/// Reading a node that has not been provisioned is an error rather than an
/// empty value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Deployed {
    order: Vec<LogicalId>,
    outputs: BTreeMap<LogicalId, ResourceOutputs>,
}

impl Deployed {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node's outputs.
    pub fn insert(&mut self, id: LogicalId, outputs: ResourceOutputs) {
        if !self.outputs.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.outputs.insert(id, outputs);
    }

    /// Whether a node has been provisioned.
    #[must_use]
    pub fn is_provisioned(&self, id: &LogicalId) -> bool {
        self.outputs.contains_key(id)
    }

    /// A node's outputs.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::NotProvisioned`] if the node has not run yet.
    pub fn outputs(&self, id: &LogicalId) -> StackResult<&ResourceOutputs> {
        self.outputs
            .get(id)
            .ok_or_else(|| StackError::NotProvisioned(id.clone()))
    }

    /// Resolve a reference to its concrete value.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::NotProvisioned`] or [`StackError::MissingOutput`].
    pub fn resolve(&self, reference: &Reference) -> StackResult<&str> {
        self.outputs(&reference.node)?
            .get(reference.attribute)
            .ok_or_else(|| StackError::MissingOutput {
                logical_id: reference.node.clone(),
                attribute: reference.attribute,
            })
    }

    /// Provisioned nodes in apply order.
    #[must_use]
    pub fn order(&self) -> &[LogicalId] {
        &self.order
    }
}

/// A named export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Export {
    /// Export name.
    pub name: String,
    /// The value exported.
    pub value: Reference,
}

/// Resolved exports, one entry per declared export.
pub type StackOutputs = BTreeMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_fail_to_read_unprovisioned_node() {
        let deployed = Deployed::new();
        let bucket = LogicalId::new("PhotoBucket").unwrap();
        assert!(matches!(
            deployed.resolve(&bucket.attr(Attribute::Name)),
            Err(StackError::NotProvisioned(_))
        ));
    }

    #[test]
    fn test_should_resolve_provisioned_output() {
        let mut deployed = Deployed::new();
        let bucket = LogicalId::new("PhotoBucket").unwrap();
        deployed.insert(
            bucket.clone(),
            ResourceOutputs::new().with(Attribute::Name, "photostack-photobucket-1234abcd"),
        );

        assert_eq!(
            deployed.resolve(&bucket.attr(Attribute::Name)).unwrap(),
            "photostack-photobucket-1234abcd"
        );
        assert!(matches!(
            deployed.resolve(&bucket.attr(Attribute::Url)),
            Err(StackError::MissingOutput { .. })
        ));
        assert_eq!(deployed.order(), &[bucket]);
    }
}
