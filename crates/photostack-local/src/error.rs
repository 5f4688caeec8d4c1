//! Local cloud error types.

use photostack_stack::BackendError;
use photostack_storage::StorageError;

/// Errors raised by the local cloud while provisioning or serving.
#[derive(Debug, thiserror::Error)]
pub enum LocalError {
    /// No function with this name or ARN exists.
    #[error("Function not found: {0}")]
    NoSuchFunction(String),

    /// No role with this name or ARN exists.
    #[error("The role defined for the function cannot be assumed: {0}")]
    NoSuchRole(String),

    /// The function's handler is not registered.
    #[error("Unknown handler '{handler}' for entry point '{entry_point}'")]
    UnknownHandler {
        /// Handler name.
        handler: String,
        /// Source entry point.
        entry_point: String,
    },

    /// No HTTP API with this id exists.
    #[error("Invalid API identifier specified: {0}")]
    NoSuchApi(String),

    /// No origin access identity with this id exists.
    #[error("The specified origin access identity does not exist: {0}")]
    NoSuchIdentity(String),

    /// No distribution with this id exists.
    #[error("The specified distribution does not exist: {0}")]
    NoSuchDistribution(String),

    /// The object store rejected the call.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<LocalError> for BackendError {
    fn from(err: LocalError) -> Self {
        Self::new(err.to_string())
    }
}

/// Convenience result alias for local cloud operations.
pub type LocalResult<T> = Result<T, LocalError>;
