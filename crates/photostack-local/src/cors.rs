//! CORS matching for HTTP APIs.
//!
//! Requests are matched against an API's [`CorsPolicy`]. A wildcard origin
//! answers `*`; otherwise the requesting origin is echoed back.

use http::HeaderMap;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    HeaderValue,
};
use photostack_stack::CorsPolicy;

/// The result of a successful CORS match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsMatch {
    /// Value for `Access-Control-Allow-Origin`.
    pub allowed_origin: String,
    /// Value for `Access-Control-Allow-Methods`.
    pub allowed_methods: Vec<String>,
    /// Request headers echoed into `Access-Control-Allow-Headers`.
    pub allowed_headers: Vec<String>,
}

/// Match an actual (non-preflight) request.
#[must_use]
pub fn match_cors(policy: &CorsPolicy, origin: &str, method: &str) -> Option<CorsMatch> {
    if !policy.allow_origins.iter().any(|p| match_origin(p, origin)) {
        return None;
    }
    if !method_allowed(policy, method) {
        return None;
    }
    Some(CorsMatch {
        allowed_origin: resolve_origin(&policy.allow_origins, origin),
        allowed_methods: allowed_methods(policy),
        allowed_headers: Vec::new(),
    })
}

/// Match a preflight (`OPTIONS`) request.
///
/// The policy lists no allowed headers, so a preflight asking for any
/// request header is rejected.
#[must_use]
pub fn match_preflight(
    policy: &CorsPolicy,
    origin: &str,
    request_method: &str,
    request_headers: &[String],
) -> Option<CorsMatch> {
    if !request_headers.is_empty() {
        return None;
    }
    match_cors(policy, origin, request_method)
}

/// Write the match into response headers.
pub fn apply_headers(headers: &mut HeaderMap, cors: &CorsMatch, preflight: bool) {
    if let Ok(v) = HeaderValue::from_str(&cors.allowed_origin) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, v);
    }
    if preflight {
        if let Ok(v) = HeaderValue::from_str(&cors.allowed_methods.join(",")) {
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, v);
        }
        if !cors.allowed_headers.is_empty() {
            if let Ok(v) = HeaderValue::from_str(&cors.allowed_headers.join(",")) {
                headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, v);
            }
        }
    }
}

/// Match an origin pattern. `*` matches any origin; otherwise the comparison
/// is exact.
#[must_use]
pub fn match_origin(pattern: &str, origin: &str) -> bool {
    pattern == "*" || pattern == origin
}

fn method_allowed(policy: &CorsPolicy, method: &str) -> bool {
    policy
        .allow_methods
        .iter()
        .any(|m| m.as_str().eq_ignore_ascii_case(method))
}

fn allowed_methods(policy: &CorsPolicy) -> Vec<String> {
    policy
        .allow_methods
        .iter()
        .map(|m| m.as_str().to_owned())
        .collect()
}

fn resolve_origin(allowed_origins: &[String], origin: &str) -> String {
    if allowed_origins.iter().any(|o| o == "*") {
        "*".to_owned()
    } else {
        origin.to_owned()
    }
}
