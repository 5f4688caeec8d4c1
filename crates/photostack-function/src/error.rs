//! Listing function errors and their HTTP mapping.

use http::StatusCode;
use serde_json::{Value, json};

/// A photo source could not complete a storage call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SourceError {
    /// Human-readable reason.
    pub message: String,
}

impl SourceError {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors the listing function reports to its caller.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    /// A required environment variable is unset or empty.
    #[error("environment variable {0} is not set")]
    MissingEnvironment(&'static str),

    /// Listing the bucket, or producing an object URL, failed.
    #[error("failed to read photos: {0}")]
    StorageRead(#[from] SourceError),
}

impl FunctionError {
    /// HTTP status reported for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingEnvironment(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StorageRead(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// JSON error body.
    ///
    /// Misconfiguration details stay in the logs; storage failures carry the
    /// source's message.
    #[must_use]
    pub fn body(&self) -> Value {
        match self {
            Self::MissingEnvironment(_) => json!({ "error": "misconfiguration" }),
            Self::StorageRead(source) => json!({
                "error": "storage_read_failed",
                "message": source.message,
            }),
        }
    }
}
