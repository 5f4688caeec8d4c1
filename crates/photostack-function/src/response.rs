//! Lambda proxy integration response.

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::FunctionError;

/// Response shape expected by an HTTP API proxy integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayResponse {
    /// HTTP status.
    pub status_code: u16,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Response body.
    pub body: String,
    /// Whether `body` is base64.
    pub is_base64_encoded: bool,
}

impl ApiGatewayResponse {
    /// A JSON response with any-origin CORS.
    #[must_use]
    pub fn json(status: StatusCode, body: &impl Serialize) -> Self {
        let body = serde_json::to_string(body).unwrap_or_else(|_| "null".to_owned());
        Self {
            status_code: status.as_u16(),
            headers: BTreeMap::from([
                ("Content-Type".to_owned(), "application/json".to_owned()),
                ("Access-Control-Allow-Origin".to_owned(), "*".to_owned()),
            ]),
            body,
            is_base64_encoded: false,
        }
    }

    /// The response for a failed invocation.
    #[must_use]
    pub fn from_error(err: &FunctionError) -> Self {
        Self::json(err.status(), &err.body())
    }

    /// The status as an [`http::StatusCode`].
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_serialize_proxy_field_names() {
        let response = ApiGatewayResponse::json(StatusCode::OK, &Vec::<String>::new());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["body"], "[]");
        assert_eq!(value["isBase64Encoded"], false);
        assert_eq!(value["headers"]["Access-Control-Allow-Origin"], "*");
    }
}
