//! Build-time site configuration.

use std::time::Duration;

use serde::Serialize;

use crate::error::WebError;

/// API base captured when this crate was compiled.
pub const BUILD_API_URL: Option<&str> = option_env!("PHOTOSTACK_API_URL");

/// Default time each slide stays up.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Path of the listing route, relative to the API base.
pub const PHOTOS_PATH: &str = "getAllPhotos";

/// Configuration baked into the site bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// API base URL, always ending in `/`.
    pub api_base: String,
    /// Slide interval.
    #[serde(rename = "intervalMs", serialize_with = "as_millis")]
    pub interval: Duration,
    /// Page title.
    pub title: String,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl SiteConfig {
    /// Configure against an explicit API base.
    #[must_use]
    pub fn new(api_base: impl Into<String>) -> Self {
        let mut api_base = api_base.into();
        if !api_base.ends_with('/') {
            api_base.push('/');
        }
        Self {
            api_base,
            interval: DEFAULT_INTERVAL,
            title: "Photo Gallery".to_owned(),
        }
    }

    /// Use the API base captured at compile time, unless `override_url` is
    /// given.
    pub fn from_build_env(override_url: Option<&str>) -> Result<Self, WebError> {
        override_url
            .or(BUILD_API_URL)
            .filter(|url| !url.trim().is_empty())
            .map(Self::new)
            .ok_or(WebError::MissingApiBase)
    }

    /// Override the slide interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// The URL the page fetches its photo list from.
    #[must_use]
    pub fn photos_url(&self) -> String {
        format!("{}{PHOTOS_PATH}", self.api_base)
    }
}
