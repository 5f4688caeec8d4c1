//! Canonical form of a query-authenticated request.
//!
//! Presigned URLs sign only the `host` header and never the payload, so the
//! canonical request reduces to
//!
//! ```text
//! METHOD
//! /encoded/path
//! sorted&encoded=query
//! host:<host>
//!
//! host
//! UNSIGNED-PAYLOAD
//! ```

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};

/// Everything except RFC 3986 unreserved characters is percent-encoded.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The payload hash presigned requests carry.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// A request reduced to the parts a presigned signature covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    method: String,
    path: String,
    query: Vec<(String, String)>,
    host: String,
}

impl CanonicalRequest {
    /// Canonicalize. `path` is taken as it appears on the wire, already
    /// percent-encoded (see [`encode_path`]); `query` holds decoded names and
    /// values.
    pub fn new<'a>(
        method: &str,
        path: &str,
        query: impl IntoIterator<Item = (&'a str, &'a str)>,
        host: &str,
    ) -> Self {
        let mut query: Vec<(String, String)> = query
            .into_iter()
            .map(|(k, v)| (encode(k), encode(v)))
            .collect();
        query.sort_unstable();
        Self {
            method: method.to_ascii_uppercase(),
            path: if path.is_empty() {
                "/".to_owned()
            } else {
                path.to_owned()
            },
            query,
            host: host.trim().to_ascii_lowercase(),
        }
    }

    /// The canonical path, which is also what goes on the wire.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The canonical query string.
    #[must_use]
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Hex SHA-256 of the canonical form.
    #[must_use]
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.to_string().as_bytes()))
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\nhost:{}\n\nhost\n{UNSIGNED_PAYLOAD}",
            self.method,
            self.path,
            self.query_string(),
            self.host
        )
    }
}

/// Percent-encode a raw path exactly once, keeping `/`. A literal `%` in an
/// object key becomes `%25`.
#[must_use]
pub fn encode_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }
    path.split('/').map(encode).collect::<Vec<_>>().join("/")
}

/// Percent-encode a query component (`/` included).
#[must_use]
pub fn encode(input: &str) -> String {
    utf8_percent_encode(input, UNRESERVED).to_string()
}
