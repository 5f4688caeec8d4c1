//! Stack error types.
//!
//! [`ConfigurationError`] is raised while the graph is being declared or
//! built, before any provisioning call. [`StackError::Provisioning`] carries a
//! backend rejection verbatim and aborts the apply.

use std::path::PathBuf;

use crate::policy::{PolicyScope, S3Action};
use crate::reference::{Attribute, LogicalId};
use crate::resource::ResourceKind;

/// The graph references an undeclared or misconfigured node.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A declare call referenced a node that has not been declared.
    #[error("resource '{0}' has not been declared")]
    UndeclaredNode(LogicalId),

    /// A declare call referenced a node of the wrong kind.
    #[error("resource '{id}' is a {actual}, expected a {expected}")]
    KindMismatch {
        /// The referenced node.
        id: LogicalId,
        /// The kind the call requires.
        expected: ResourceKind,
        /// The node's actual kind.
        actual: ResourceKind,
    },

    /// Two nodes share a logical ID.
    #[error("resource '{0}' is already declared")]
    DuplicateLogicalId(LogicalId),

    /// A logical ID is not alphanumeric or does not start with a letter.
    #[error("invalid logical id '{0}'")]
    InvalidLogicalId(String),

    /// A deployment source directory is missing at build time.
    #[error("deployment source '{}' does not exist or is not a directory", .0.display())]
    MissingSource(PathBuf),

    /// A string does not name an allowed S3 action.
    #[error("'{0}' is not an allowed S3 action")]
    UnknownAction(String),

    /// An action was granted on a resource scope it does not apply to.
    #[error("{action} cannot be granted on {scope}")]
    InvalidPolicyScope {
        /// The misplaced action.
        action: S3Action,
        /// The scope it was granted on.
        scope: PolicyScope,
    },

    /// A policy statement grants no actions.
    #[error("policy statement on '{0}' grants no actions")]
    EmptyStatement(LogicalId),

    /// A distribution origin bucket does not block public access.
    #[error("bucket '{0}' must block all public access to be served through a distribution")]
    PublicOrigin(LogicalId),

    /// A route path does not start with `/`.
    #[error("route path '{0}' must start with '/'")]
    InvalidRoutePath(String),

    /// A reference names an attribute the node kind does not produce.
    #[error("resource '{id}' ({kind}) has no {attribute} output")]
    UnknownAttribute {
        /// The referenced node.
        id: LogicalId,
        /// Its kind.
        kind: ResourceKind,
        /// The requested attribute.
        attribute: Attribute,
    },

    /// An export name is declared twice.
    #[error("export '{0}' is already declared")]
    DuplicateExport(String),

    /// The dependency graph is not acyclic.
    #[error("dependency cycle among: {}", .0.iter().map(LogicalId::as_str).collect::<Vec<_>>().join(", "))]
    Cycle(Vec<LogicalId>),
}

/// Errors raised while building, applying, or reading a stack.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// The graph is invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The backend rejected a resource.
    #[error("failed to provision '{logical_id}': {message}")]
    Provisioning {
        /// The node being provisioned.
        logical_id: LogicalId,
        /// The backend's message, verbatim.
        message: String,
    },

    /// A node's outputs were read before it was provisioned.
    #[error("outputs of '{0}' are not available until it is provisioned")]
    NotProvisioned(LogicalId),

    /// A provisioned node lacks the requested output.
    #[error("resource '{logical_id}' has no {attribute} output")]
    MissingOutput {
        /// The node.
        logical_id: LogicalId,
        /// The missing attribute.
        attribute: Attribute,
    },
}

/// Convenience result alias for stack operations.
pub type StackResult<T> = Result<T, StackError>;
