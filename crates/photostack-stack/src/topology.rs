//! The photo gallery stack.

use http::Method;
use photostack_core::StackConfig;

use crate::builder::StackBuilder;
use crate::error::ConfigurationError;
use crate::policy::{PolicyResource, S3Action};
use crate::reference::Attribute;
use crate::resource::{BucketEncryption, BucketOptions, PublicAccess};
use crate::stack::Stack;

/// Environment variable the listing function reads its bucket from.
pub const PHOTO_BUCKET_ENV: &str = "PHOTO_BUCKET_NAME";
/// Route serving the photo listing.
pub const PHOTOS_ROUTE: &str = "/getAllPhotos";
/// Handler name of the listing function.
pub const GET_PHOTOS_HANDLER: &str = "getPhotos";

/// Export names.
pub mod exports {
    /// Photo bucket name.
    pub const BUCKET_NAME: &str = "PhotoStackBucketName";
    /// Site bucket name.
    pub const WEBSITE_BUCKET_NAME: &str = "PhotoStackWebsiteBucketName";
    /// Public site URL.
    pub const WEBSITE_URL: &str = "PhotoStackWebsiteURL";
    /// Listing function name.
    pub const FUNCTION: &str = "PhotoStackFunction";
    /// HTTP API base URL.
    pub const API_ENDPOINT: &str = "PhotoStackApiEndpoint";
}

/// Declare the gallery: a photo bucket seeded from `photos_dir`, a private
/// site bucket behind a CDN, and a listing function on `GET /getAllPhotos`.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] if either source directory is missing.
pub fn photo_stack(config: &StackConfig) -> Result<Stack, ConfigurationError> {
    let mut builder = StackBuilder::new(config);

    let photos = builder.declare_bucket(
        "PhotoBucket",
        BucketOptions::builder()
            .encryption(BucketEncryption::S3Managed)
            .build(),
    )?;
    builder.declare_deployment(&config.photos_dir, &photos)?;

    let site = builder.declare_bucket(
        "WebsiteBucket",
        BucketOptions::builder()
            .encryption(BucketEncryption::S3Managed)
            .public_access(PublicAccess::BlockAll)
            .versioned(true)
            .index_document("index.html")
            .build(),
    )?;
    builder.declare_deployment(&config.site_dir, &site)?;
    let distribution = builder.declare_distribution(&site)?;

    let function = builder.declare_function(
        "GetPhotos",
        "api/get-photos",
        GET_PHOTOS_HANDLER,
        [(PHOTO_BUCKET_ENV, photos.attr(Attribute::Name))],
    )?;
    builder.declare_policy(&function, PolicyResource::bucket(&photos), [S3Action::ListBucket])?;
    builder.declare_policy(
        &function,
        PolicyResource::objects(&photos),
        [S3Action::GetObject, S3Action::PutObject],
    )?;
    let route = builder.declare_route(PHOTOS_ROUTE, Method::GET, &function)?;
    let api = builder
        .http_api()
        .cloned()
        .ok_or(ConfigurationError::UndeclaredNode(route))?;

    builder.declare_export(exports::BUCKET_NAME, photos.attr(Attribute::Name))?;
    builder.declare_export(exports::WEBSITE_BUCKET_NAME, site.attr(Attribute::Name))?;
    builder.declare_export(exports::WEBSITE_URL, distribution.attr(Attribute::Url))?;
    builder.declare_export(exports::FUNCTION, function.attr(Attribute::Name))?;
    builder.declare_export(exports::API_ENDPOINT, api.attr(Attribute::Url))?;

    builder.build()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::reference::LogicalId;
    use crate::resource::ResourceKind;

    fn config(root: &Path) -> StackConfig {
        let photos = root.join("photos");
        let site = root.join("site");
        std::fs::create_dir_all(&photos).unwrap();
        std::fs::create_dir_all(&site).unwrap();
        StackConfig::builder()
            .photos_dir(photos)
            .site_dir(site)
            .build()
    }

    #[test]
    fn test_should_declare_gallery_resources() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let stack = photo_stack(&config).unwrap();

        let count = |kind| stack.nodes().iter().filter(|n| n.kind() == kind).count();
        assert_eq!(count(ResourceKind::Bucket), 2);
        assert_eq!(count(ResourceKind::BucketDeployment), 2);
        assert_eq!(count(ResourceKind::Function), 1);
        assert_eq!(count(ResourceKind::RolePolicy), 1);
        assert_eq!(count(ResourceKind::HttpApi), 1);
        assert_eq!(count(ResourceKind::Route), 1);
        assert_eq!(count(ResourceKind::Distribution), 1);

        let names: Vec<&str> = stack.exports().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                exports::BUCKET_NAME,
                exports::WEBSITE_BUCKET_NAME,
                exports::WEBSITE_URL,
                exports::FUNCTION,
                exports::API_ENDPOINT,
            ]
        );
    }

    #[test]
    fn test_should_order_function_after_its_bucket_and_policy() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let stack = photo_stack(&config).unwrap();
        let pos = |name: &str| {
            stack
                .order()
                .iter()
                .position(|id| id == &LogicalId::new(name).unwrap())
                .unwrap()
        };

        assert!(pos("PhotoBucket") < pos("GetPhotos"));
        assert!(pos("GetPhotosServiceRoleDefaultPolicy") < pos("GetPhotos"));
        assert!(pos("GetPhotos") < pos("PhotoApiGetGetAllPhotosRoute"));
        assert!(pos("WebsiteBucketPolicy") < pos("WebsiteBucketDistribution"));
    }

    #[test]
    fn test_should_fail_without_photo_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = StackConfig::builder()
            .photos_dir(dir.path().join("missing"))
            .site_dir(dir.path().to_path_buf())
            .build();
        assert!(matches!(
            photo_stack(&config),
            Err(ConfigurationError::MissingSource(_))
        ));
    }
}
