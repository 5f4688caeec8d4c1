//! Presigned object reads at `/s3/{bucket}/{key}`.

use http::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, HeaderValue};
use http::request::Parts;
use http::{Method, Response, StatusCode};
use percent_encoding::percent_decode_str;
use photostack_auth::verify_presigned;
use photostack_storage::{StorageError, StoredObject};
use serde_json::json;
use tracing::debug;

use crate::body::{GatewayBody, empty, full, json_response};
use crate::cloud::LocalCloud;

/// Serve an object. Only presigned `GET` and `HEAD` are accepted.
pub fn handle_object(cloud: &LocalCloud, parts: &Parts, rest: &str) -> Response<GatewayBody> {
    if parts.method != Method::GET && parts.method != Method::HEAD {
        return error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "MethodNotAllowed",
            "The specified method is not allowed against this resource.",
        );
    }
    if let Err(e) = verify_presigned(parts, cloud.keyring()) {
        debug!(path = %parts.uri.path(), error = %e, "presigned request rejected");
        return error_response(StatusCode::FORBIDDEN, "AccessDenied", &e.to_string());
    }

    let Some((bucket, raw_key)) = rest.split_once('/') else {
        return error_response(StatusCode::BAD_REQUEST, "InvalidRequest", "missing object key");
    };
    let Some(key) = decode_key(raw_key) else {
        return error_response(StatusCode::BAD_REQUEST, "InvalidRequest", "malformed object key");
    };

    match cloud.store().get_object(bucket, &key) {
        Ok(object) => object_response(&object, parts.method == Method::HEAD),
        Err(e) => storage_error_response(&e),
    }
}

/// Percent-decode a key taken from a request path. Empty keys are `None`.
pub(crate) fn decode_key(raw: &str) -> Option<String> {
    let key = percent_decode_str(raw).decode_utf8().ok()?;
    (!key.is_empty()).then(|| key.into_owned())
}

/// A `200` carrying the object, or only its headers for `HEAD`.
pub(crate) fn object_response(object: &StoredObject, head: bool) -> Response<GatewayBody> {
    let mut response = Response::new(if head {
        empty()
    } else {
        full(object.data.clone())
    });
    let headers = response.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&object.content_type) {
        headers.insert(CONTENT_TYPE, v);
    }
    if let Ok(v) = HeaderValue::from_str(&object.etag) {
        headers.insert(ETAG, v);
    }
    headers.insert(CONTENT_LENGTH, HeaderValue::from(object.size()));
    response
}

/// A JSON error body with an S3-style code.
pub(crate) fn error_response(status: StatusCode, code: &str, message: &str) -> Response<GatewayBody> {
    json_response(status, &json!({"error": code, "message": message}))
}

pub(crate) fn storage_error_response(err: &StorageError) -> Response<GatewayBody> {
    match err {
        StorageError::NoSuchBucket { .. } => {
            error_response(StatusCode::NOT_FOUND, "NoSuchBucket", &err.to_string())
        }
        StorageError::NoSuchKey { .. } => {
            error_response(StatusCode::NOT_FOUND, "NoSuchKey", &err.to_string())
        }
        _ => error_response(StatusCode::BAD_REQUEST, "InvalidRequest", &err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn test_should_decode_percent_encoded_keys() {
        assert_eq!(decode_key("2024/my%20photo.jpg").unwrap(), "2024/my photo.jpg");
        assert_eq!(decode_key(""), None);
        assert_eq!(decode_key("%FF"), None);
        assert_eq!(decode_key("a%2541.jpg").unwrap(), "a%41.jpg");
    }

    #[test]
    fn test_should_send_headers_only_for_head() {
        let object = StoredObject::new("a.jpg", Bytes::from_static(b"jpeg"), "image/jpeg");
        let response = object_response(&object, true);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/jpeg");
        assert_eq!(response.headers()[CONTENT_LENGTH], "4");
        assert_eq!(response.headers()[ETAG], object.etag.as_str());
    }

    #[test]
    fn test_should_map_missing_key_to_not_found() {
        let err = StorageError::NoSuchKey {
            bucket: "b".to_owned(),
            key: "k".to_owned(),
        };
        assert_eq!(storage_error_response(&err).status(), StatusCode::NOT_FOUND);
    }
}
