//! Core errors.

/// Invalid identifiers or settings.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Not a 12-digit account number.
    #[error("invalid AWS account ID {0:?}: expected 12 digits")]
    InvalidAccountId(String),

    /// Not a region code such as `us-east-1`.
    #[error("invalid AWS region {0:?}")]
    InvalidRegion(String),

    /// An environment setting could not be parsed.
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidSetting {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
