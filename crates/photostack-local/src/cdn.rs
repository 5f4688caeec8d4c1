//! CDN distributions at `/cdn/{id}/{path}`.
//!
//! A distribution reads its origin bucket as its origin access identity, so
//! a request only succeeds if the bucket policy grants that identity
//! `s3:GetObject` on the requested object.

use http::request::Parts;
use http::{Method, Response, StatusCode};
use photostack_core::Arn;
use photostack_stack::S3Action;
use tracing::debug;

use crate::body::GatewayBody;
use crate::cloud::LocalCloud;
use crate::objects::{decode_key, error_response, object_response, storage_error_response};

/// Serve `path` from the distribution `distribution_id`.
pub fn handle_cdn(
    cloud: &LocalCloud,
    parts: &Parts,
    distribution_id: &str,
    path: &str,
) -> Response<GatewayBody> {
    let Ok(distribution) = cloud.state().distribution(distribution_id) else {
        return error_response(
            StatusCode::NOT_FOUND,
            "NoSuchDistribution",
            "The specified distribution does not exist.",
        );
    };
    if parts.method != Method::GET && parts.method != Method::HEAD {
        return error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "MethodNotAllowed",
            "The specified method is not allowed against this resource.",
        );
    }

    let key = if path.is_empty() {
        distribution.default_root_object.clone()
    } else {
        match decode_key(path) {
            Some(key) => key,
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "InvalidRequest",
                    "malformed object path",
                );
            }
        }
    };

    let resource = Arn::s3_object(&distribution.bucket, &key);
    let granted = cloud
        .state()
        .bucket_policy(&distribution.bucket)
        .iter()
        .any(|s| s.allows_principal(&distribution.identity_id, S3Action::GetObject, resource.as_str()));
    if !granted {
        debug!(
            distribution = %distribution.id,
            identity = %distribution.identity_id,
            %resource,
            "origin read denied by bucket policy"
        );
        return error_response(StatusCode::FORBIDDEN, "AccessDenied", "Access Denied");
    }

    match cloud.store().get_object(&distribution.bucket, &key) {
        Ok(object) => object_response(&object, parts.method == Method::HEAD),
        Err(e) => storage_error_response(&e),
    }
}
