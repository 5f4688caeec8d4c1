//! The photo listing function.
//!
//! [`handle`] reads the bucket from the execution environment, lists it
//! through a [`PhotoSource`], and answers with a proxy-integration response
//! carrying a JSON array of [`photostack_core::PhotoRecord`]s.

pub mod env;
pub mod error;
pub mod handler;
pub mod response;
pub mod s3;
pub mod source;

pub use env::{FunctionEnv, PHOTO_BUCKET_NAME};
pub use error::{FunctionError, SourceError};
pub use handler::{get_photos, handle};
pub use response::ApiGatewayResponse;
pub use s3::S3PhotoSource;
pub use source::PhotoSource;
