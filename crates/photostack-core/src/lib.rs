//! Core types, configuration, and identifiers for PhotoStack.
//!
//! This crate provides the building blocks shared by every PhotoStack crate:
//! the per-run [`StackConfig`], AWS account/region identifiers, ARN
//! construction, and the [`PhotoRecord`] wire type exchanged between the
//! listing function and the presentation layer.

mod arn;
mod config;
mod error;
mod record;
mod types;

pub use arn::Arn;
pub use config::StackConfig;
pub use error::{CoreError, CoreResult};
pub use record::PhotoRecord;
pub use types::{AccountId, AwsRegion};
