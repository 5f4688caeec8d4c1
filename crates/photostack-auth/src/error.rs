//! Presigned URL errors.

/// Why a presigned URL could not be produced or was refused.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A query parameter is absent or unparsable.
    #[error("malformed presigned query: {0}")]
    MalformedQuery(String),

    /// `X-Amz-Algorithm` is not `AWS4-HMAC-SHA256`.
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The URL signs headers other than `host`, or the request has no host.
    #[error("only the host header may be signed")]
    UnsupportedSignedHeaders,

    /// The credential's access key is not in the keyring.
    #[error("unknown access key: {0}")]
    UnknownAccessKey(String),

    /// The signature does not cover this request.
    #[error("signature does not match")]
    SignatureMismatch,

    /// `X-Amz-Date` plus `X-Amz-Expires` lies in the past.
    #[error("presigned URL expired at {0}")]
    Expired(String),

    /// The endpoint is not an absolute `scheme://host` URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
