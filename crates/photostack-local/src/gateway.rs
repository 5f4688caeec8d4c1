//! Gateway service that routes requests to the local cloud's resources.
//!
//! | Path | Served by |
//! |------|-----------|
//! | `/_health`, `/health` | the gateway |
//! | `/api/{api-id}/{route}` | [`crate::api::handle_api`] |
//! | `/s3/{bucket}/{key}` | [`crate::objects::handle_object`] |
//! | `/cdn/{distribution-id}/{path}` | [`crate::cdn::handle_cdn`] |

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::request::Parts;
use http::{Method, Request, Response, StatusCode};
use hyper::body::Incoming;
use hyper::service::Service;
use serde_json::json;
use tracing::debug;

use crate::api::handle_api;
use crate::body::{GatewayBody, json_response};
use crate::cdn::handle_cdn;
use crate::cloud::LocalCloud;
use crate::objects::handle_object;

/// Version reported by the health check.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP front door of a [`LocalCloud`].
#[derive(Debug, Clone)]
pub struct LocalGateway {
    cloud: Arc<LocalCloud>,
}

impl LocalGateway {
    /// Serve `cloud`.
    #[must_use]
    pub fn new(cloud: Arc<LocalCloud>) -> Self {
        Self { cloud }
    }

    /// The cloud being served.
    #[must_use]
    pub fn cloud(&self) -> &LocalCloud {
        &self.cloud
    }

    /// Route one request. Request bodies are never read.
    pub async fn handle(&self, parts: Parts) -> Response<GatewayBody> {
        let path = parts.uri.path().to_owned();
        let response = if is_health_check(&parts.method, &path) {
            json_response(
                StatusCode::OK,
                &json!({"status": "running", "version": VERSION}),
            )
        } else if let Some(rest) = path.strip_prefix("/api/") {
            let (api_id, route) = split_first(rest);
            handle_api(&self.cloud, &parts, api_id, route).await
        } else if let Some(rest) = path.strip_prefix("/s3/") {
            handle_object(&self.cloud, &parts, rest)
        } else if let Some(rest) = path.strip_prefix("/cdn/") {
            let (distribution_id, object_path) = split_first(rest);
            handle_cdn(&self.cloud, &parts, distribution_id, object_path)
        } else {
            json_response(StatusCode::NOT_FOUND, &json!({"message": "Not Found"}))
        };
        debug!(
            method = %parts.method,
            path = %path,
            status = response.status().as_u16(),
            "handled request"
        );
        response
    }
}

impl Service<Request<Incoming>> for LocalGateway {
    type Response = Response<GatewayBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let (parts, _body) = req.into_parts();
        let gateway = self.clone();
        Box::pin(async move { Ok(gateway.handle(parts).await) })
    }
}

/// Split `id/rest` at the first `/`. A bare `id` yields an empty rest.
fn split_first(path: &str) -> (&str, &str) {
    path.split_once('/').unwrap_or((path, ""))
}

fn is_health_check(method: &Method, path: &str) -> bool {
    *method == Method::GET && (path == "/_health" || path == "/health")
}
