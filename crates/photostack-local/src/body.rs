//! Response bodies served by the gateway.

use std::convert::Infallible;
use std::io;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use serde_json::Value;

/// Type-erased response body shared by every gateway route.
pub type GatewayBody = BoxBody<Bytes, io::Error>;

/// A buffered body.
pub fn full(data: impl Into<Bytes>) -> GatewayBody {
    Full::new(data.into())
        .map_err(|never: Infallible| match never {})
        .boxed()
}

/// An empty body.
#[must_use]
pub fn empty() -> GatewayBody {
    Empty::new().map_err(|never: Infallible| match never {}).boxed()
}

/// A JSON response.
#[must_use]
pub fn json_response(status: StatusCode, body: &Value) -> Response<GatewayBody> {
    let mut response = Response::new(full(body.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// A response with no body.
#[must_use]
pub fn empty_response(status: StatusCode) -> Response<GatewayBody> {
    let mut response = Response::new(empty());
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use http_body::Body as _;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_build_json_response() {
        let response = json_response(StatusCode::NOT_FOUND, &json!({"message": "Not Found"}));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.body().size_hint().exact(), Some(23));
    }

    #[test]
    fn test_should_report_empty_body_as_end_of_stream() {
        assert!(empty().is_end_stream());
    }
}
