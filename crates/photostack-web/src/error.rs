//! Presentation layer errors.

use std::path::PathBuf;

/// Errors raised while fetching photos or writing the site bundle.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The request failed or returned a non-success status.
    #[error("photo feed request failed: {0}")]
    Network(String),

    /// The response body was not a photo list.
    #[error("photo feed returned an invalid body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A page template failed to render.
    #[error("failed to render template: {0}")]
    Template(#[from] askama::Error),

    /// No API base URL was configured at build time.
    #[error("no API base URL configured; set PHOTOSTACK_API_URL")]
    MissingApiBase,

    /// Writing the bundle failed.
    #[error("failed to write {path}: {source}")]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for WebError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
