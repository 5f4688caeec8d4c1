//! Logical identifiers, output attributes, and deferred references.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// The logical (template-level) identifier of a resource node.
///
/// Logical IDs are alphanumeric and start with a letter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    /// Validate and wrap a logical ID.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidLogicalId`] if the ID is empty,
    /// contains a non-alphanumeric character, or does not start with a letter.
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigurationError> {
        let id = id.into();
        let valid = id.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && id.chars().all(|c| c.is_ascii_alphanumeric());
        if valid {
            Ok(Self(id))
        } else {
            Err(ConfigurationError::InvalidLogicalId(id))
        }
    }

    /// Build a logical ID by PascalCasing the alphanumeric runs of `raw`,
    /// e.g. `photo-api` becomes `PhotoApi`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidLogicalId`] if nothing usable is left.
    pub fn pascal(raw: &str) -> Result<Self, ConfigurationError> {
        let id: String = raw
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|s| !s.is_empty())
            .map(|segment| {
                let mut chars = segment.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_ascii_uppercase().to_string() + chars.as_str()
                })
            })
            .collect();
        if id.is_empty() {
            return Err(ConfigurationError::InvalidLogicalId(raw.to_owned()));
        }
        Self::new(id)
    }

    /// The ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reference one of this node's outputs.
    #[must_use]
    pub fn attr(&self, attribute: Attribute) -> Reference {
        Reference {
            node: self.clone(),
            attribute,
        }
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An output attribute a provisioned node exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Attribute {
    /// Physical name.
    Name,
    /// Amazon Resource Name.
    Arn,
    /// Service-assigned identifier.
    Id,
    /// Public URL.
    Url,
    /// Host name the resource is served under.
    DomainName,
}

impl Attribute {
    /// The attribute's display name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Arn => "Arn",
            Self::Id => "Id",
            Self::Url => "Url",
            Self::DomainName => "DomainName",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deferred value: one attribute of another node, resolved after that node
/// is provisioned. Every reference is also a dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// The node being referenced.
    pub node: LogicalId,
    /// Which of its outputs.
    pub attribute: Attribute,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.attribute)
    }
}
