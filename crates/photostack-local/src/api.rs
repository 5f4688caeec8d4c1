//! HTTP API requests: CORS preflight, route matching, and proxy
//! integration with the route's function.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use http::header::{ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN};
use http::request::Parts;
use http::{HeaderName, HeaderValue, Method, Response, StatusCode};
use photostack_function::ApiGatewayResponse;
use serde_json::json;
use tracing::{debug, warn};

use crate::body::{GatewayBody, empty_response, full, json_response};
use crate::cloud::LocalCloud;
use crate::cors::{apply_headers, match_cors, match_preflight};

/// Serve `/{rest}` on the API with id `api_id`.
pub async fn handle_api(
    cloud: &LocalCloud,
    parts: &Parts,
    api_id: &str,
    rest: &str,
) -> Response<GatewayBody> {
    let Ok(api) = cloud.state().api(api_id) else {
        return not_found();
    };
    let origin = header_str(parts, &ORIGIN);

    if parts.method == Method::OPTIONS {
        if let (Some(origin), Some(request_method)) =
            (origin, header_str(parts, &ACCESS_CONTROL_REQUEST_METHOD))
        {
            let request_headers = request_headers(parts);
            let mut response = empty_response(StatusCode::NO_CONTENT);
            match match_preflight(&api.cors, origin, request_method, &request_headers) {
                Some(cors) => apply_headers(response.headers_mut(), &cors, true),
                None => debug!(api = %api.id, origin, request_method, "preflight rejected"),
            }
            return response;
        }
    }

    let path = format!("/{rest}");
    let Some(route) = api.route(&parts.method, &path) else {
        debug!(api = %api.id, method = %parts.method, path = %path, "no matching route");
        return not_found();
    };

    let mut response = match cloud.invoke(&route.function_name).await {
        Ok(invocation) => proxy_response(&invocation),
        Err(e) => {
            warn!(function = %route.function_name, error = %e, "integration failed");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({"message": "Internal Server Error"}),
            )
        }
    };

    if let Some(cors) = origin.and_then(|o| match_cors(&api.cors, o, parts.method.as_str())) {
        apply_headers(response.headers_mut(), &cors, false);
    }
    response
}

/// Turn a proxy integration result into an HTTP response.
fn proxy_response(invocation: &ApiGatewayResponse) -> Response<GatewayBody> {
    let body = if invocation.is_base64_encoded {
        match BASE64.decode(invocation.body.as_bytes()) {
            Ok(decoded) => Bytes::from(decoded),
            Err(e) => {
                warn!(error = %e, "function returned a malformed base64 body");
                return json_response(
                    StatusCode::BAD_GATEWAY,
                    &json!({"message": "Internal Server Error"}),
                );
            }
        }
    } else {
        Bytes::from(invocation.body.clone())
    };

    let mut response = Response::new(full(body));
    *response.status_mut() = invocation.status();
    for (name, value) in &invocation.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => warn!(header = %name, "dropping invalid response header"),
        }
    }
    response
}

fn header_str<'a>(parts: &'a Parts, name: &HeaderName) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

fn request_headers(parts: &Parts) -> Vec<String> {
    header_str(parts, &ACCESS_CONTROL_REQUEST_HEADERS)
        .map(|raw| {
            raw.split(',')
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn not_found() -> Response<GatewayBody> {
    json_response(StatusCode::NOT_FOUND, &json!({"message": "Not Found"}))
}
