//! Resource graph for PhotoStack.
//!
//! Resources are declared through a [`StackBuilder`]. Declarations may refer
//! to outputs of earlier ones through [`Reference`]s; every reference is a
//! dependency edge. [`StackBuilder::build`] checks the graph and fixes a
//! deterministic apply order, and [`Stack::apply`] walks that order against a
//! [`ProvisioningBackend`], resolving references as it goes.
//!
//! ```
//! use photostack_core::StackConfig;
//! use photostack_stack::{Attribute, BucketOptions, StackBuilder};
//!
//! let config = StackConfig::default();
//! let mut builder = StackBuilder::new(&config);
//! let bucket = builder
//!     .declare_bucket("PhotoBucket", BucketOptions::default())
//!     .unwrap();
//! builder
//!     .declare_export("BucketName", bucket.attr(Attribute::Name))
//!     .unwrap();
//! let stack = builder.build().unwrap();
//! assert_eq!(stack.order().len(), 1);
//! ```

pub mod backend;
pub mod builder;
pub mod error;
pub mod graph;
pub mod outputs;
pub mod policy;
pub mod reference;
pub mod resource;
pub mod stack;
mod template;
pub mod topology;

pub use backend::{BackendError, ProvisioningBackend, ResolvedSpec};
pub use builder::StackBuilder;
pub use error::{ConfigurationError, StackError, StackResult};
pub use outputs::{Deployed, Export, ResourceOutputs, StackOutputs};
pub use policy::{PolicyResource, PolicyScope, PolicyStatement, ResolvedStatement, S3Action};
pub use reference::{Attribute, LogicalId, Reference};
pub use resource::{
    BucketEncryption, BucketOptions, CorsPolicy, EnvValue, PublicAccess, RemovalPolicy,
    ResourceConfig, ResourceKind, ResourceNode,
};
pub use stack::{PlanStep, Stack};
pub use topology::photo_stack;
