//! Execution environment of the listing function.

use crate::error::FunctionError;

/// Variable holding the bucket to list.
pub const PHOTO_BUCKET_NAME: &str = "PHOTO_BUCKET_NAME";

/// What the function reads from its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEnv {
    /// Bucket to list.
    pub bucket: String,
}

impl FunctionEnv {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self, FunctionError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through an arbitrary lookup, e.g. a function's configured
    /// environment map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FunctionError> {
        let bucket = lookup(PHOTO_BUCKET_NAME)
            .filter(|v| !v.trim().is_empty())
            .ok_or(FunctionError::MissingEnvironment(PHOTO_BUCKET_NAME))?;
        Ok(Self { bucket })
    }
}
