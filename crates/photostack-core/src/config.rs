//! Per-run configuration for PhotoStack.
//!
//! A [`StackConfig`] is built once per provisioning run and passed by
//! reference into every declare call and into the local cloud. Values are
//! loaded from environment variables.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::types::{AccountId, AwsRegion};

/// PhotoStack configuration.
///
/// # Examples
///
/// ```
/// use photostack_core::StackConfig;
///
/// let config = StackConfig::default();
/// assert_eq!(config.stack_name, "photostack");
/// assert_eq!(config.endpoint_url(), "http://127.0.0.1:4566");
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct StackConfig {
    /// Stack name, used as the prefix of generated physical names.
    #[builder(default = String::from("photostack"))]
    pub stack_name: String,

    /// Bind address for the local gateway.
    #[builder(default = String::from("127.0.0.1:4566"))]
    pub gateway_listen: String,

    /// Externally reachable base URL of the gateway. Derived from
    /// `gateway_listen` when unset.
    #[builder(default, setter(strip_option))]
    pub public_endpoint: Option<String>,

    /// Region resources are provisioned into.
    #[builder(default)]
    pub default_region: AwsRegion,

    /// Account resources are provisioned into.
    #[builder(default)]
    pub account_id: AccountId,

    /// Local directory synchronized into the photo bucket.
    #[builder(default = PathBuf::from("photos"))]
    pub photos_dir: PathBuf,

    /// Local directory holding the compiled site bundle.
    #[builder(default = PathBuf::from("frontend/build"))]
    pub site_dir: PathBuf,

    /// Name of the HTTP API.
    #[builder(default = String::from("photo-api"))]
    pub api_name: String,

    /// Validity of presigned photo URLs, in seconds.
    #[builder(default = 3600)]
    pub presign_expiry_secs: u64,

    /// Access key used to presign object URLs.
    #[builder(default = String::from("test"))]
    pub access_key: String,

    /// Secret key used to presign object URLs.
    #[builder(default = String::from("test"))]
    pub secret_key: String,

    /// Log level filter string.
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for StackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackConfig")
            .field("stack_name", &self.stack_name)
            .field("gateway_listen", &self.gateway_listen)
            .field("public_endpoint", &self.public_endpoint)
            .field("default_region", &self.default_region)
            .field("account_id", &self.account_id)
            .field("photos_dir", &self.photos_dir)
            .field("site_dir", &self.site_dir)
            .field("api_name", &self.api_name)
            .field("presign_expiry_secs", &self.presign_expiry_secs)
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl StackConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `STACK_NAME` | `photostack` |
    /// | `GATEWAY_LISTEN` | `127.0.0.1:4566` |
    /// | `PUBLIC_ENDPOINT` | *(derived from `GATEWAY_LISTEN`)* |
    /// | `DEFAULT_REGION` | `us-east-1` |
    /// | `ACCOUNT_ID` | `000000000000` |
    /// | `PHOTOS_DIR` | `photos` |
    /// | `SITE_DIR` | `frontend/build` |
    /// | `API_NAME` | `photo-api` |
    /// | `PRESIGN_EXPIRY_SECS` | `3600` |
    /// | `ACCESS_KEY` | `test` |
    /// | `SECRET_KEY` | `test` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// # Errors
    /// Returns an error if `ACCOUNT_ID`, `DEFAULT_REGION`, or `PRESIGN_EXPIRY_SECS` is malformed.
    pub fn from_env() -> crate::CoreResult<Self> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("STACK_NAME") {
            config.stack_name = v;
        }
        if let Ok(v) = std::env::var("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Ok(v) = std::env::var("PUBLIC_ENDPOINT") {
            config.public_endpoint = Some(v);
        }
        if let Ok(v) = std::env::var("DEFAULT_REGION") {
            config.default_region = AwsRegion::new(v)?;
        }
        if let Ok(v) = std::env::var("ACCOUNT_ID") {
            config.account_id = AccountId::new(v)?;
        }
        if let Ok(v) = std::env::var("PHOTOS_DIR") {
            config.photos_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SITE_DIR") {
            config.site_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("API_NAME") {
            config.api_name = v;
        }
        if let Ok(v) = std::env::var("PRESIGN_EXPIRY_SECS") {
            config.presign_expiry_secs =
                v.parse().map_err(|_| crate::CoreError::InvalidSetting {
                    name: "PRESIGN_EXPIRY_SECS",
                    value: v.clone(),
                    reason: "expected a whole number of seconds",
                })?;
        }
        if let Ok(v) = std::env::var("ACCESS_KEY") {
            config.access_key = v;
        }
        if let Ok(v) = std::env::var("SECRET_KEY") {
            config.secret_key = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        tracing::debug!(config = ?config, "loaded stack configuration");
        Ok(config)
    }

    /// Base URL of the gateway without a trailing slash.
    ///
    /// A wildcard bind address is rewritten to loopback so generated URLs are
    /// fetchable from the same host.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        match &self.public_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_owned(),
            None => format!(
                "http://{}",
                self.gateway_listen.replace("0.0.0.0", "127.0.0.1")
            ),
        }
    }
}
